pub mod backend;
pub mod config;
pub mod errors;
pub mod search;

pub use backend::{Backend, Descent, Filesystem, FtpSession, FtpTree, VisitedLocation, ZipArchive};
pub use config::{CliOverrides, SearchConfig};
pub use errors::{SearchError, SearchResult};
pub use search::{get_first_file, search_many, CancelToken, Finder, PatternMatcher, SearchKind, SearchObserver};
