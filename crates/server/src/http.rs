//! HTTP server on Axum

use async_trait::async_trait;
use axum::Router;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::traits::Server;

/// Serves a router until its shutdown token is cancelled
///
/// Clones share running state, so a clone kept by the caller can report the
/// bound address of a server running on another task.
#[derive(Clone)]
pub struct HttpServer {
    name: String,
    config: ServerConfig,
    router: Router,
    running: Arc<AtomicBool>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
    ready: Arc<Notify>,
}

impl HttpServer {
    pub fn new(name: impl Into<String>, config: ServerConfig, router: Router) -> Self {
        Self {
            name: name.into(),
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            bound_addr: Arc::new(RwLock::new(None)),
            ready: Arc::new(Notify::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Wait until the listener is bound and return its address
    pub async fn wait_ready(&self) -> SocketAddr {
        loop {
            let notified = self.ready.notified();
            if let Some(addr) = *self.bound_addr.read() {
                return addr;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.config.socket_addr()?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;
        let local_addr = listener.local_addr().map_err(ServerError::Io)?;

        *self.bound_addr.write() = Some(local_addr);
        self.running.store(true, Ordering::SeqCst);
        self.ready.notify_waiters();
        info!(server = %self.name, %local_addr, "HTTP server listening");

        let name = self.name.clone();
        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!(server = %name, "HTTP server received shutdown signal");
            })
            .await;

        self.running.store(false, Ordering::SeqCst);
        *self.bound_addr.write() = None;

        match result {
            Ok(()) => {
                info!(server = %self.name, "HTTP server shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!(server = %self.name, %e, "HTTP server error");
                Err(ServerError::Io(e))
            }
        }
    }
}
