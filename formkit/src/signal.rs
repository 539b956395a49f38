//! One-shot completion signal
//!
//! A resolve-once flag that any number of tasks can await. Built on a
//! `tokio::sync::watch` channel so waiting never misses a resolution that
//! happened before the wait began.

use tokio::sync::watch;

/// A one-shot completion signal.
///
/// Cloning yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    tx: watch::Sender<bool>,
}

impl CompletionSignal {
    /// Create an unresolved signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Create a signal that is already resolved.
    pub fn resolved() -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx }
    }

    /// Resolve the signal, waking all waiters. Resolving twice is a no-op.
    pub fn resolve(&self) {
        self.tx.send_replace(true);
    }

    /// True once the signal has been resolved.
    pub fn is_resolved(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal is resolved. Returns immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // Closed-channel errors cannot happen while we hold the sender.
        let _ = rx.wait_for(|resolved| *resolved).await;
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}
