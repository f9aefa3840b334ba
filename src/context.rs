//! Per-request context threaded through fetches and resolutions.

use std::sync::Arc;

use tokio::sync::watch;

/// Context passed to every upstream fetch and mirror resolution.
///
/// Carries the cancellation signal. Callers can poll it with
/// [`Self::is_cancelled`] between steps or race in-flight work against
/// [`Self::cancelled`]. Cloning shares the signal, so a caller can keep one
/// handle and cancel work running on another.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    cancelled: Arc<watch::Sender<bool>>,
}

impl Default for ResolveContext {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            cancelled: Arc::new(tx),
        }
    }
}

impl ResolveContext {
    /// Creates a context that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every operation using this context.
    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Completes once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
