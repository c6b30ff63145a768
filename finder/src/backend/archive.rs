use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use super::{Backend, Descent, VisitedLocation};
use crate::errors::{unify_path, SearchError, SearchResult};

/// Flat view of a zip archive's entry names.
///
/// This is not a per-directory walk: the whole archive is reported as a single
/// location, named after the archive file, holding every folder and file name
/// whose nesting fits the depth limit. An entry `a/b/c.txt` is nested one
/// level (its segment count minus two), so with depth 0 only top-level names
/// and names directly inside top-level folders are kept.
///
/// Since nothing is ever descended into, excluded folder names only hide the
/// folders themselves: files stored under them are still listed.
#[derive(Debug)]
pub struct ZipArchive {
    path: String,
    location: Option<VisitedLocation>,
}

impl ZipArchive {
    /// Opens the archive at `path` and reads its name table.
    ///
    /// `depth` follows [`SearchConfig::depth`](crate::SearchConfig::depth):
    /// -1 keeps every entry.
    pub fn open(path: impl AsRef<Path>, depth: i32) -> SearchResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
        let archive = zip::ZipArchive::new(BufReader::new(file))?;
        debug!("Opened {} with {} entries", path.display(), archive.len());

        let display = unify_path(path).to_string_lossy().into_owned();
        Ok(Self::from_names(display, archive.file_names(), depth))
    }

    /// Builds the listing from entry names already read elsewhere.
    pub fn from_names<I, S>(path: impl Into<String>, names: I, depth: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = path.into();
        let mut location = VisitedLocation::new(path.clone(), 0);

        for name in names {
            let name = name.as_ref();
            let segments: Vec<&str> = name.split('/').collect();
            let nesting = segments.len() as i64 - 2;
            if depth > -1 && i64::from(depth) < nesting {
                continue;
            }

            let (is_dir, entry) = if name.ends_with('/') && segments.len() >= 2 {
                (true, segments[segments.len() - 2])
            } else {
                (false, segments[segments.len() - 1])
            };
            if entry.is_empty() {
                continue;
            }
            if is_dir {
                location.child_dirs.push(entry.to_string());
            } else {
                location.files.push(entry.to_string());
            }
        }

        Self {
            path,
            location: Some(location),
        }
    }
}

impl Backend for ZipArchive {
    fn separator(&self) -> char {
        '/'
    }

    fn root(&self) -> &str {
        &self.path
    }

    fn next_location(&mut self) -> Option<SearchResult<VisitedLocation>> {
        self.location.take().map(Ok)
    }

    fn descend(&mut self, _descent: Descent) {
        // Only one location exists, there is nothing further to enter.
    }
}
