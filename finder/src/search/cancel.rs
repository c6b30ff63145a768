use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{SearchError, SearchResult};

/// Shared flag that stops a running search.
///
/// Clones share the flag, so one handle can be kept by the caller while
/// another travels with the search. The engine checks it once per visited
/// location, which is the only interruption point of a slow FTP walk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Err(SearchError::Cancelled)` once [`cancel`](Self::cancel) was called.
    pub fn check(&self) -> SearchResult<()> {
        if self.is_cancelled() {
            Err(SearchError::Cancelled)
        } else {
            Ok(())
        }
    }
}
