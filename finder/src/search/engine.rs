use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::cancel::CancelToken;
use super::matcher::PatternMatcher;
use super::observer::{NoopObserver, SearchObserver};
use crate::backend::{Backend, Descent, Filesystem, FtpSession, FtpTree, VisitedLocation, ZipArchive};
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};

/// What a search looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Files,
    Folders,
}

/// Runs file and folder searches for one [`SearchConfig`].
///
/// The finder holds no traversal state: every call builds its own matcher and
/// consumes the backend it is given, so one finder can serve many searches.
#[derive(Clone)]
pub struct Finder {
    config: SearchConfig,
    observer: Arc<dyn SearchObserver>,
    cancel: CancelToken,
}

impl std::fmt::Debug for Finder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Finder {
    /// Creates a finder after checking the configuration.
    pub fn new(config: SearchConfig) -> SearchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: Arc::new(NoopObserver),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Full paths of the files whose name matches the pattern.
    ///
    /// With `stop_on_first_match` the walk ends at the first location holding a
    /// match and only that location's first match is returned.
    pub fn find_files<B: Backend + ?Sized>(&self, backend: &mut B) -> SearchResult<Vec<String>> {
        let matcher = self.matcher()?;
        let separator = backend.separator();
        info!(
            "Looking for files matching {:?} in {}",
            self.config.pattern,
            backend.root()
        );

        let mut found = Vec::new();
        while let Some(location) = self.next_location(backend)? {
            let mut matches = location
                .files
                .iter()
                .filter(|name| matcher.matches(name))
                .map(|name| location.join(name, separator));

            if self.config.stop_on_first_match {
                if let Some(first) = matches.next() {
                    self.observer.on_match(&first);
                    info!("Stopping at first match {}", first);
                    return Ok(vec![first]);
                }
            } else {
                for path in matches {
                    self.observer.on_match(&path);
                    found.push(path);
                }
            }

            backend.descend(self.plan_descent(&location, &HashSet::new()));
        }

        info!("{} files found", found.len());
        Ok(found)
    }

    /// Full paths of the folders whose name matches the pattern.
    ///
    /// With `stop_on_first_match` every match of the first location holding
    /// one is returned. Otherwise matches accumulate over the whole walk, and a
    /// matched folder is only entered when `descend_into_matched_folder` is set.
    pub fn find_folders<B: Backend + ?Sized>(&self, backend: &mut B) -> SearchResult<Vec<String>> {
        let matcher = self.matcher()?;
        let separator = backend.separator();
        info!(
            "Looking for folders matching {:?} in {}",
            self.config.pattern,
            backend.root()
        );

        let mut found = Vec::new();
        while let Some(location) = self.next_location(backend)? {
            let matched: HashSet<&str> = location
                .child_dirs
                .iter()
                .filter(|name| !self.config.excluded_names.contains(*name))
                .filter(|name| matcher.matches(name))
                .map(String::as_str)
                .collect();

            // Keep listing order rather than set order.
            let paths: Vec<String> = location
                .child_dirs
                .iter()
                .filter(|name| matched.contains(name.as_str()))
                .map(|name| location.join(name, separator))
                .collect();
            for path in &paths {
                self.observer.on_match(path);
            }

            if !paths.is_empty() && self.config.stop_on_first_match {
                info!("Stopping after {} matches in {}", paths.len(), location.path);
                return Ok(paths);
            }
            found.extend(paths);

            let skip = if self.config.descend_into_matched_folder {
                HashSet::new()
            } else {
                matched
            };
            backend.descend(self.plan_descent(&location, &skip));
        }

        info!("{} folders found", found.len());
        Ok(found)
    }

    /// File search over the local tree at `config.root`.
    pub fn find_files_in_dir(&self) -> SearchResult<Vec<String>> {
        self.find_files(&mut Filesystem::new(&self.config.root)?)
    }

    /// Folder search over the local tree at `config.root`.
    pub fn find_folders_in_dir(&self) -> SearchResult<Vec<String>> {
        self.find_folders(&mut Filesystem::new(&self.config.root)?)
    }

    /// File search inside the zip archive at `config.root`.
    pub fn find_files_in_zip(&self) -> SearchResult<Vec<String>> {
        self.find_files(&mut ZipArchive::open(&self.config.root, self.config.depth)?)
    }

    /// File search below `config.root` on an already logged-in FTP session.
    pub fn find_files_in_ftp<S: FtpSession + ?Sized>(&self, session: &mut S) -> SearchResult<Vec<String>> {
        let root = self.config.root.to_string_lossy();
        self.find_files(&mut FtpTree::new(session, &root)?)
    }

    /// Folder search below `config.root` on an already logged-in FTP session.
    pub fn find_folders_in_ftp<S: FtpSession + ?Sized>(&self, session: &mut S) -> SearchResult<Vec<String>> {
        let root = self.config.root.to_string_lossy();
        self.find_folders(&mut FtpTree::new(session, &root)?)
    }

    fn matcher(&self) -> SearchResult<PatternMatcher> {
        PatternMatcher::compile(&self.config.pattern, self.config.case_sensitive)
    }

    /// Pulls the next location, checking for cancellation first so that no
    /// further backend I/O happens once a search was cancelled.
    fn next_location<B: Backend + ?Sized>(&self, backend: &mut B) -> SearchResult<Option<VisitedLocation>> {
        self.cancel.check()?;
        match backend.next_location() {
            Some(location) => {
                let location = location?;
                debug!("Scanning {}", location.path);
                self.observer.on_location(&location);
                Ok(Some(location))
            }
            None => Ok(None),
        }
    }

    /// Children of `location` the backend may still enter: none once the
    /// depth limit is reached, otherwise everything except excluded names and
    /// `skip`.
    fn plan_descent(&self, location: &VisitedLocation, skip: &HashSet<&str>) -> Descent {
        if let Some(max) = self.config.max_depth() {
            if location.level >= max {
                trace!("Depth limit reached at {}", location.path);
                return Descent::none();
            }
        }

        Descent::only(
            location
                .child_dirs
                .iter()
                .filter(|name| !self.config.excluded_names.contains(*name))
                .filter(|name| !skip.contains(name.as_str()))
                .cloned(),
        )
    }
}

/// First file directly inside `root` whose name matches `pattern`, ignoring
/// case. `Ok(None)` when there is none.
pub fn get_first_file(root: impl AsRef<Path>, pattern: &str) -> SearchResult<Option<String>> {
    let config = SearchConfig::new(root.as_ref(), pattern)
        .with_depth(0)
        .with_case_sensitive(false);
    let files = Finder::new(config)?.find_files_in_dir()?;
    Ok(files.into_iter().next())
}

/// Runs independent local searches in parallel, one result per config, in
/// the order given.
pub fn search_many(configs: &[SearchConfig], kind: SearchKind) -> SearchResult<Vec<SearchResult<Vec<String>>>> {
    let threads = configs.len().clamp(1, num_cpus::get());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SearchError::config_error(format!("cannot start search pool: {}", e)))?;

    Ok(pool.install(|| {
        configs
            .par_iter()
            .map(|config| {
                let finder = Finder::new(config.clone())?;
                match kind {
                    SearchKind::Files => finder.find_files_in_dir(),
                    SearchKind::Folders => finder.find_folders_in_dir(),
                }
            })
            .collect()
    }))
}
