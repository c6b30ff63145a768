use std::collections::VecDeque;
use tracing::{debug, warn};

use super::{join_path, Backend, Descent, VisitedLocation};
use crate::errors::{SearchError, SearchResult};

/// The FTP commands a tree walk needs.
///
/// Implemented for [`suppaftp::FtpStream`]; tests and alternative clients can
/// provide their own. The session is owned by the caller and must already be
/// connected and logged in.
pub trait FtpSession {
    /// Current remote working directory (`PWD`).
    fn pwd(&mut self) -> SearchResult<String>;

    /// Changes the remote working directory (`CWD`).
    fn cwd(&mut self, path: &str) -> SearchResult<()>;

    /// Raw `LIST` output for the current working directory, one entry per line.
    fn list(&mut self) -> SearchResult<Vec<String>>;
}

impl FtpSession for suppaftp::FtpStream {
    fn pwd(&mut self) -> SearchResult<String> {
        suppaftp::FtpStream::pwd(self).map_err(|e| SearchError::backend_access("PWD", e))
    }

    fn cwd(&mut self, path: &str) -> SearchResult<()> {
        suppaftp::FtpStream::cwd(self, path).map_err(|e| SearchError::backend_access(path, e))
    }

    fn list(&mut self) -> SearchResult<Vec<String>> {
        suppaftp::FtpStream::list(self, None).map_err(|e| SearchError::backend_access("LIST", e))
    }
}

/// Depth-first walk of a remote directory tree over a borrowed FTP session.
///
/// The session's working directory is moved into every visited location with
/// an absolute `CWD`. Once a subtree is exhausted it is moved back to the
/// parent, and once the whole walk ends it is returned to where it was before
/// the walk started. A walk abandoned early (e.g. stop-on-first-match) leaves
/// it at the last visited location.
///
/// A location that cannot be entered or listed is reported empty and the walk
/// carries on with its siblings; only a failure at the root is fatal.
pub struct FtpTree<'a, S: FtpSession + ?Sized> {
    session: &'a mut S,
    root: String,
    origin: String,
    stack: Vec<Frame>,
    pending: Option<Frame>,
    started: bool,
    finished: bool,
}

#[derive(Debug)]
struct Frame {
    path: String,
    level: usize,
    children: VecDeque<String>,
}

impl<'a, S: FtpSession + ?Sized> FtpTree<'a, S> {
    /// Prepares a walk of `root`. A relative root is resolved against the
    /// session's current working directory.
    pub fn new(session: &'a mut S, root: &str) -> SearchResult<Self> {
        let origin = session.pwd()?;
        let root = normalize_root(&origin, root);
        Ok(Self {
            session,
            root,
            origin,
            stack: Vec::new(),
            pending: None,
            started: false,
            finished: false,
        })
    }

    fn visit(&mut self, path: &str, level: usize) -> SearchResult<VisitedLocation> {
        self.session.cwd(path)?;
        let lines = self.session.list()?;

        let mut location = VisitedLocation::new(path, level);
        for line in &lines {
            match parse_list_line(line) {
                Some(ListEntry::Dir(name)) => location.child_dirs.push(name),
                Some(ListEntry::File(name)) => location.files.push(name),
                None => {}
            }
        }
        debug!(
            "Listed {}: {} folders, {} files",
            path,
            location.child_dirs.len(),
            location.files.len()
        );
        Ok(location)
    }

    fn yield_location(&mut self, location: VisitedLocation) -> Option<SearchResult<VisitedLocation>> {
        self.pending = Some(Frame {
            path: location.path.clone(),
            level: location.level,
            children: location.child_dirs.iter().cloned().collect(),
        });
        Some(Ok(location))
    }

    fn restore(&mut self, path: &str) {
        if let Err(e) = self.session.cwd(path) {
            warn!("Could not return to {}: {}", path, e);
        }
    }
}

impl<'a, S: FtpSession + ?Sized> Backend for FtpTree<'a, S> {
    fn separator(&self) -> char {
        '/'
    }

    fn root(&self) -> &str {
        &self.root
    }

    fn next_location(&mut self) -> Option<SearchResult<VisitedLocation>> {
        if self.finished {
            return None;
        }

        if !self.started {
            self.started = true;
            let root = self.root.clone();
            return match self.visit(&root, 0) {
                Ok(location) => self.yield_location(location),
                Err(e) => {
                    self.finished = true;
                    Some(Err(e))
                }
            };
        }

        if let Some(frame) = self.pending.take() {
            self.stack.push(frame);
        }

        loop {
            let Some(top) = self.stack.last_mut() else {
                self.finished = true;
                let origin = self.origin.clone();
                self.restore(&origin);
                return None;
            };

            if let Some(child) = top.children.pop_front() {
                let path = join_path(&top.path, &child, '/');
                let level = top.level + 1;
                let location = match self.visit(&path, level) {
                    Ok(location) => location,
                    Err(e) => {
                        warn!("Treating {} as empty: {}", path, e);
                        VisitedLocation::new(path, level)
                    }
                };
                return self.yield_location(location);
            }

            self.stack.pop();
            if let Some(parent) = self.stack.last() {
                let parent = parent.path.clone();
                self.restore(&parent);
            }
        }
    }

    fn descend(&mut self, descent: Descent) {
        if let Some(frame) = self.pending.as_mut() {
            frame.children.retain(|name| descent.allows(name));
        }
    }
}

fn normalize_root(origin: &str, root: &str) -> String {
    let absolute = if root.starts_with('/') {
        root.to_string()
    } else if root.is_empty() || root == "." {
        origin.to_string()
    } else {
        join_path(origin, root, '/')
    };

    let trimmed = absolute.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ListEntry {
    Dir(String),
    File(String),
}

/// Parses one line of Unix-style `LIST` output.
///
/// The permission field decides the kind (`d...` is a folder, anything else a
/// file). The name is everything after the eighth field, so names containing
/// spaces are kept whole; short lines fall back to the last field. Lines
/// without a permission field, such as the `total N` header, are skipped.
fn parse_list_line(line: &str) -> Option<ListEntry> {
    let mut fields = line.split_whitespace();
    let kind = fields.next()?;
    if !kind.starts_with(['-', 'd', 'l', 'b', 'c', 'p', 's']) {
        return None;
    }

    let mut name = if line.split_whitespace().count() >= 9 {
        skip_fields(line, 8)
    } else {
        line.split_whitespace().last()?
    };
    if kind.starts_with('l') {
        if let Some((link, _target)) = name.split_once(" -> ") {
            name = link;
        }
    }

    if name.is_empty() || is_dot_entry(name) {
        return None;
    }

    if kind.starts_with('d') {
        Some(ListEntry::Dir(name.to_string()))
    } else {
        Some(ListEntry::File(name.to_string()))
    }
}

fn skip_fields(line: &str, count: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..count {
        rest = match rest.find(char::is_whitespace) {
            Some(i) => rest[i..].trim_start(),
            None => "",
        };
    }
    rest.trim_end()
}

/// `.` and `..` (and any other all-dot name) are never real children.
fn is_dot_entry(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c == '.')
}
