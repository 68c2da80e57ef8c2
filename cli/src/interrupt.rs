//! Process interrupt handling for long-running commands.

use tracing::warn;

/// Resolves on the first SIGINT (Ctrl-C) or SIGTERM.
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Like [`wait_for_interrupt`], but never resolves if the handlers could not
/// be installed.
pub async fn shutdown_signal() {
    if let Err(e) = wait_for_interrupt().await {
        warn!(error = %e, "cannot listen for interrupts; stop the process externally");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn stays_pending_without_a_signal() {
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown_signal()).await;
        assert!(waited.is_err());
    }
}
