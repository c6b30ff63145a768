use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::trace;

use crate::errors::{SearchError, SearchResult};

/// Compiled patterns kept around at most. Past that the cache is emptied and
/// refilled, so long-running processes that see many patterns stay bounded.
const MAX_CACHED_PATTERNS: usize = 256;

static PATTERN_CACHE: Lazy<DashMap<(String, bool), Arc<Regex>>> = Lazy::new(DashMap::new);

/// Compiled name pattern.
///
/// Matching is unanchored: `"log"` matches `catalog.txt`. Anchor with `^`/`$`
/// when a whole-name match is wanted.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Arc<Regex>,
}

impl PatternMatcher {
    /// Compiles `pattern`, reusing an earlier compilation of the same
    /// pattern/case pair when one exists.
    pub fn compile(pattern: &str, case_sensitive: bool) -> SearchResult<Self> {
        let key = (pattern.to_string(), case_sensitive);
        if let Some(entry) = PATTERN_CACHE.get(&key) {
            trace!("Pattern cache hit for {:?}", pattern);
            return Ok(Self {
                regex: Arc::clone(entry.value()),
            });
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| SearchError::invalid_pattern(format!("{}: {}", pattern, e)))?;
        let regex = Arc::new(regex);
        remember(&PATTERN_CACHE, key, Arc::clone(&regex));

        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

fn remember(cache: &DashMap<(String, bool), Arc<Regex>>, key: (String, bool), regex: Arc<Regex>) {
    if cache.len() >= MAX_CACHED_PATTERNS {
        trace!("Pattern cache full, clearing");
        cache.clear();
    }
    cache.insert(key, regex);
}
