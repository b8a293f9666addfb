//! Cancellation utilities
//!
//! A first-class cancellation handle for long-running operations. The
//! handle is cheap to clone and share across tasks; the poller observes
//! it at every suspension point, so cancellation takes effect at the
//! next await rather than preemptively.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a fresh, uncancelled handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Operations observing this handle stop at
    /// their next suspension point.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once cancellation is requested; never resolves otherwise.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
