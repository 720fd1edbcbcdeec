//! Shutdown coordination for the simulator process.
//!
//! A shutdown can start from an OS signal, from the `quit` console command
//! or from a region whose in-world restart is configured to shut the process
//! down. All of them flip the same [`ShutdownState`], which the application
//! awaits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

/// Shared shutdown state for coordinating graceful shutdown across components.
#[derive(Debug, Clone)]
pub struct ShutdownState {
    /// Set once shutdown has been requested
    shutdown_initiated: Arc<AtomicBool>,
    /// Set once regions and modules have been torn down
    shutdown_complete: Arc<AtomicBool>,
    /// Wakes tasks waiting in [`ShutdownState::wait_for_shutdown`]
    notify: Arc<Notify>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Initiates shutdown. Repeated calls are harmless.
    pub fn initiate_shutdown(&self) {
        if !self.shutdown_initiated.swap(true, Ordering::AcqRel) {
            info!("🛑 Shutdown initiated - regions will be stopped");
        }
        self.notify.notify_waiters();
    }

    /// Marks shutdown as complete - all regions and modules are down.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ All regions stopped - ready for final cleanup");
    }

    /// Resolves once shutdown has been initiated.
    pub async fn wait_for_shutdown(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_shutdown_initiated() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_after_initiation() {
        let state = ShutdownState::new();
        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.wait_for_shutdown().await })
        };

        tokio::task::yield_now().await;
        state.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
        assert!(state.is_shutdown_initiated());
        assert!(!state.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_already_initiated() {
        let state = ShutdownState::new();
        state.initiate_shutdown();
        state.initiate_shutdown();
        state.wait_for_shutdown().await;
        state.complete_shutdown();
        assert!(state.is_shutdown_complete());
    }
}
