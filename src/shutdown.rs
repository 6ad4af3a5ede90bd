use std::future::Future;

use tracing::{error, info};

/// Resolves when `signal` fires. If the signal handler cannot be installed the
/// server keeps running instead of stopping right after startup.
pub async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(?e, "Failed to listen for the shutdown signal; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
