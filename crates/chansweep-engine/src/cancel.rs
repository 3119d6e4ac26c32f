//! Cooperative cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Advisory cancellation flag polled between channel iterations.
///
/// Cancellation is checked, never preemptive: an in-flight delete call
/// always completes before the flag is observed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the current run.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new run starts.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
