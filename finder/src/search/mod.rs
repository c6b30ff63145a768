/// Name matching and the search engine driving the backends.
///
/// A search is a single pass over the locations a [`Backend`](crate::backend::Backend)
/// yields. For each location the engine matches names, decides whether to stop,
/// and tells the backend which child folders to enter next. Nothing survives
/// between two searches.
pub mod cancel;
pub mod engine;
pub mod matcher;
pub mod observer;

pub use cancel::CancelToken;
pub use engine::{get_first_file, search_many, Finder, SearchKind};
pub use matcher::PatternMatcher;
pub use observer::{NoopObserver, SearchObserver};
