//! Liveness scope of one panel activation
//!
//! A scope is active from creation until the panel that owns it deactivates
//! (unmounts or navigates away). Asynchronous work started on behalf of the
//! panel hands its result through [`PanelScope::admit`] before touching any
//! panel-local state; once the scope is deactivated the result is dropped.
//! Deactivation does not cancel the underlying I/O or the cache write.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PanelScope {
    token: CancellationToken,
    suppressed: Arc<AtomicUsize>,
}

impl PanelScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn deactivate(&self) {
        if self.is_active() {
            debug!("Panel scope deactivated");
        }
        self.token.cancel();
    }

    /// Pass `value` through while the scope is active; otherwise drop it
    /// and record the suppression.
    pub fn admit<T>(&self, value: T) -> Option<T> {
        if self.is_active() {
            Some(value)
        } else {
            let count = self.suppressed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(suppressed = count, "Dropped continuation for inactive panel");
            None
        }
    }

    /// Number of continuations dropped because the scope was inactive
    pub fn suppressed(&self) -> usize {
        self.suppressed.load(Ordering::SeqCst)
    }
}
