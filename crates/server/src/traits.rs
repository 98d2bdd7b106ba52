//! Server lifecycle traits

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// A long-running listener driven by a cancellation token
///
/// `run` binds, serves until `shutdown` is cancelled, drains in-flight
/// requests and returns `Ok(())` on a clean stop.
#[async_trait]
pub trait Server: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Bound address while running
    fn address(&self) -> Option<SocketAddr>;

    fn is_running(&self) -> bool;

    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// Spawn helpers, implemented for every [`Server`]
pub trait ServerExt: Server + Sized {
    /// Run on a background task tied to `shutdown`
    fn spawn_with(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Run on a background task with its own token
    fn spawn(self) -> (tokio::task::JoinHandle<Result<()>>, CancellationToken) {
        let token = CancellationToken::new();
        let handle = self.spawn_with(token.clone());
        (handle, token)
    }
}

impl<T: Server + Sized> ServerExt for T {}
