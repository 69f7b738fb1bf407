//! Signal handling for graceful shutdown

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Waits for SIGTERM or SIGINT so the daemon can tear down its socket
/// and stop capture cleanly.
#[derive(Default)]
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Resolve on the first shutdown signal
    pub async fn wait(&self) {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                info!(?e, "SIGTERM handler unavailable, waiting on ctrl-c only");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM");
            }
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("received interrupt");
                }
            }
        }
    }
}
