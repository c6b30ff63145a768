use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, warn};

use super::{Backend, Descent, VisitedLocation};
use crate::errors::{unify_path, SearchError, SearchResult};

/// Top-down, depth-first walk of a local directory tree.
///
/// Children are only read when the walk reaches them, so a [`Descent`] issued
/// for a location keeps the excluded subtrees from ever being opened.
/// Symbolic links to directories are listed as child folders but never
/// followed.
#[derive(Debug)]
pub struct Filesystem {
    root: String,
    stack: Vec<(PathBuf, usize)>,
    pending: Option<PendingChildren>,
}

/// Children of the last yielded location, not yet pushed for visiting.
#[derive(Debug)]
struct PendingChildren {
    level: usize,
    /// Display name plus the real path, which may not be valid UTF-8.
    enterable: Vec<(String, PathBuf)>,
}

impl Filesystem {
    /// Resolves `root` to an absolute path and prepares the walk.
    ///
    /// Fails immediately when the root does not exist or is not a directory.
    pub fn new(root: impl AsRef<Path>) -> SearchResult<Self> {
        let root = root.as_ref();
        let resolved = fs::canonicalize(root).map_err(|e| SearchError::from_io(root, e))?;
        let resolved = unify_path(&resolved);
        if !resolved.is_dir() {
            return Err(SearchError::backend_access(
                resolved.display().to_string(),
                "not a directory",
            ));
        }

        Ok(Self {
            root: resolved.to_string_lossy().into_owned(),
            stack: vec![(resolved, 0)],
            pending: None,
        })
    }

    fn push_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            // Reverse so the first child is visited first.
            for (_, path) in pending.enterable.into_iter().rev() {
                self.stack.push((path, pending.level + 1));
            }
        }
    }
}

impl Backend for Filesystem {
    fn separator(&self) -> char {
        MAIN_SEPARATOR
    }

    fn root(&self) -> &str {
        &self.root
    }

    fn next_location(&mut self) -> Option<SearchResult<VisitedLocation>> {
        self.push_pending();
        let (dir, level) = self.stack.pop()?;

        let (location, enterable) = match read_location(&dir, level) {
            Ok(read) => read,
            Err(e) if level == 0 => return Some(Err(e)),
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                let path = dir.to_string_lossy().into_owned();
                (VisitedLocation::new(path, level), Vec::new())
            }
        };

        self.pending = Some(PendingChildren {
            level,
            enterable,
        });
        Some(Ok(location))
    }

    fn descend(&mut self, descent: Descent) {
        if let Some(pending) = self.pending.as_mut() {
            pending.enterable.retain(|(name, _)| descent.allows(name));
        }
    }
}

/// Lists one directory. Returns the location plus the child folders that may
/// be entered (everything except symlinked folders), keyed by display name.
fn read_location(
    dir: &Path,
    level: usize,
) -> SearchResult<(VisitedLocation, Vec<(String, PathBuf)>)> {
    let mut location = VisitedLocation::new(dir.to_string_lossy().into_owned(), level);
    let mut enterable = Vec::new();

    let entries = fs::read_dir(dir).map_err(|e| SearchError::from_io(dir, e))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                debug!("Cannot stat {}: {}", entry.path().display(), e);
                location.files.push(name);
                continue;
            }
        };

        if file_type.is_dir() {
            enterable.push((name.clone(), entry.path()));
            location.child_dirs.push(name);
        } else if file_type.is_symlink() && entry.path().is_dir() {
            location.child_dirs.push(name);
        } else {
            location.files.push(name);
        }
    }

    location.child_dirs.sort();
    location.files.sort();
    enterable.sort();
    Ok((location, enterable))
}
