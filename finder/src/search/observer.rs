use crate::backend::VisitedLocation;

/// Hooks called while a search runs.
///
/// Both methods default to doing nothing, so implementors only override what
/// they care about (progress output, collecting statistics, ...).
pub trait SearchObserver: Send + Sync {
    /// Called for every location before its names are matched.
    fn on_location(&self, _location: &VisitedLocation) {}

    /// Called for every path added to the result.
    fn on_match(&self, _path: &str) {}
}

/// Observer that ignores everything. Used when none is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}
