//! Graceful shutdown for the release worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

struct ShutdownState {
    initiated: AtomicBool,
}

/// A cloneable handle for triggering shutdown of the release worker.
///
/// Idempotent: only the first call to [`ShutdownSignal::shutdown`] has any
/// effect, so multiple owners can hold a clone without coordinating.
#[derive(Clone)]
pub struct ShutdownSignal {
    state: Arc<ShutdownState>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(ShutdownState {
                initiated: AtomicBool::new(false),
            }),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn shutdown(&self) {
        if !self.state.initiated.swap(true, Ordering::AcqRel) {
            self.notify.notify_waiters();
        }
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.state.initiated.load(Ordering::Acquire)
    }

    /// Resolves once [`ShutdownSignal::shutdown`] has been called, waking a
    /// currently-parked release loop immediately rather than waiting for
    /// its next natural tick.
    pub async fn wait(&self) {
        if self.is_shutdown() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
