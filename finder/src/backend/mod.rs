/// Traversal sources the search engine can walk.
///
/// Each backend turns its native listing primitive into a sequence of
/// [`VisitedLocation`]s: a local directory tree read with `read_dir`, a remote
/// FTP tree listed with `LIST`, or the flat name table of a zip archive.
///
/// The engine talks back to the backend through [`Backend::descend`]: after it
/// has looked at a location it says which of that location's child folders may
/// be entered. This is how depth limits, excluded names and "do not look
/// inside a matched folder" are enforced without the engine reaching into the
/// backend's state:
/// ```rust,ignore
/// while let Some(location) = backend.next_location() {
///     let location = location?;
///     // ... match names ...
///     backend.descend(Descent::only(kept_children));
/// }
/// ```
use std::collections::HashSet;

pub mod archive;
pub mod filesystem;
pub mod ftp;

pub use archive::ZipArchive;
pub use filesystem::Filesystem;
pub use ftp::{FtpSession, FtpTree};

use crate::errors::SearchResult;

/// One step of a traversal: a location with the names directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitedLocation {
    /// Full path of the location, in the backend's native notation
    pub path: String,
    /// Names of the folders directly inside this location
    pub child_dirs: Vec<String>,
    /// Names of the files directly inside this location
    pub files: Vec<String>,
    /// Levels below the backend root, the root being 0
    pub level: usize,
}

impl VisitedLocation {
    pub fn new(path: impl Into<String>, level: usize) -> Self {
        Self {
            path: path.into(),
            child_dirs: Vec::new(),
            files: Vec::new(),
            level,
        }
    }

    /// Full path of `name` inside this location.
    pub fn join(&self, name: &str, separator: char) -> String {
        join_path(&self.path, name, separator)
    }
}

pub(crate) fn join_path(parent: &str, name: &str, separator: char) -> String {
    if parent.ends_with(separator) {
        format!("{}{}", parent, name)
    } else {
        format!("{}{}{}", parent, separator, name)
    }
}

/// Which children of the last yielded location the backend may enter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descent {
    allowed: HashSet<String>,
}

impl Descent {
    /// Enter none of the children.
    pub fn none() -> Self {
        Self::default()
    }

    /// Enter only the named children. Names the backend never listed are ignored.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// A hierarchical source the engine can search.
///
/// Locations are produced lazily and depth-first. A backend must not yield the
/// same location twice.
pub trait Backend {
    /// Separator used to build full paths (`/` for FTP and zip).
    fn separator(&self) -> char;

    /// The resolved root location of this traversal.
    fn root(&self) -> &str;

    /// Advances to the next location, or `None` once the traversal is done.
    ///
    /// A fatal error ends the traversal; callers should not keep polling after
    /// receiving `Some(Err(_))`.
    fn next_location(&mut self) -> Option<SearchResult<VisitedLocation>>;

    /// Restricts the children of the most recently yielded location that will
    /// be entered. Takes effect on the next call to
    /// [`next_location`](Backend::next_location); without it every child is
    /// entered.
    fn descend(&mut self, descent: Descent);
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn separator(&self) -> char {
        (**self).separator()
    }

    fn root(&self) -> &str {
        (**self).root()
    }

    fn next_location(&mut self) -> Option<SearchResult<VisitedLocation>> {
        (**self).next_location()
    }

    fn descend(&mut self, descent: Descent) {
        (**self).descend(descent)
    }
}
