//! Signal handling for graceful simulator shutdown.
//!
//! The first SIGINT/SIGTERM (Ctrl+C on Windows) starts a graceful shutdown of
//! all regions; the application installs a second, silent handler afterwards
//! that exits at once if the operator insists.

use region_event_system::ShutdownState;
use tokio::signal;
use tracing::info;

/// Waits for a termination signal and flips `shutdown_state`.
///
/// # Platform Support
///
/// * **Unix platforms**: Handles SIGINT and SIGTERM signals
/// * **Windows**: Handles Ctrl+C signal
///
/// # Example
///
/// ```rust,no_run
/// use lib_simulator::signals::wait_for_signal;
/// use region_event_system::ShutdownState;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let shutdown_state = ShutdownState::new();
///     wait_for_signal(&shutdown_state).await?;
///     assert!(shutdown_state.is_shutdown_initiated());
///     Ok(())
/// }
/// ```
pub async fn wait_for_signal(shutdown_state: &ShutdownState) -> Result<(), Box<dyn std::error::Error>> {
    wait_for_signal_silent().await?;
    info!("📡 Received shutdown signal - initiating graceful shutdown");
    shutdown_state.initiate_shutdown();
    Ok(())
}

/// Resolves on the next termination signal without logging anything.
pub async fn wait_for_signal_silent() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    Ok(())
}
