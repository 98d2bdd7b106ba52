//! Shutdown coordination with `CancellationToken`
//!
//! One controller owns the root token. The results listener and the run
//! loop each take a child token, so Ctrl+C reaches both while a child can
//! still be cancelled on its own.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone, Debug, Default)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller cancelled on the first Ctrl+C
    pub fn with_ctrl_c() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, shutting down");
                    token.cancel();
                }
                Err(e) => {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
            }
        });

        controller
    }

    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn shutdown(&self) {
        info!("Manual shutdown triggered");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }
}
