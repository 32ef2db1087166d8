//! Process-wide shutdown signal.
//!
//! Shared between the engine's signal handler, the broadcast loop, and
//! the HTTP server. Requesting shutdown is idempotent and wakes every
//! current waiter.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One-way latch that tasks can poll or await.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    /// Create an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Wait until shutdown is requested.
    ///
    /// Returns immediately if it already has been.
    pub async fn wait(&self) {
        // Register before checking the flag so a request that lands in
        // between is not missed.
        let notified = self.notify.notified();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}
