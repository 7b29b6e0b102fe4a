//! Shutdown coordination for the server.

use std::sync::Arc;

use tokio::sync::watch;

/// Process-wide stop signal.
///
/// Cloning shares the same signal. Once triggered it stays triggered, so
/// tasks that start waiting after the trigger still observe it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new, untriggered signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trigger the shutdown signal. Returns false if it had already fired.
    pub fn trigger(&self) -> bool {
        let first = self.tx.send_if_modified(|triggered| {
            let changed = !*triggered;
            *triggered = true;
            changed
        });
        if first {
            tracing::info!("Shutdown requested");
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal has fired.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on trigger.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
