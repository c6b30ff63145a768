use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Parameters of one search.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.finder.yaml` in the current directory
/// 3. Global `$HOME/.config/finder/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Directory, FTP path or zip archive to search in
/// root: "/data/incoming"
///
/// # Regular expression tested against each file or folder name
/// pattern: "report_\\d+\\.csv$"
///
/// # -1 = unbounded, 0 = root only, n = at most n levels below root
/// depth: 2
///
/// # Return as soon as a location yields a match
/// stop_on_first_match: false
///
/// # Keep walking into folders that already matched
/// descend_into_matched_folder: false
///
/// # Folder names never reported nor entered
/// excluded_names:
///   - ".git"
///   - "node_modules"
///
/// case_sensitive: true
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// When using the CLI, command-line arguments take precedence over config file
/// values. The merging behavior is defined in [`SearchConfig::merge_with_cli`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Root location: a directory, an FTP path or a zip archive path
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Regular expression searched for in each name (unanchored)
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Levels below root the traversal may enter, -1 for no limit
    #[serde(default = "default_depth")]
    pub depth: i32,

    /// Stop the whole traversal at the first location with a match
    #[serde(default = "default_true")]
    pub stop_on_first_match: bool,

    /// Walk into folders that matched a folder search
    #[serde(default)]
    pub descend_into_matched_folder: bool,

    /// Folder names that are neither reported nor descended into
    #[serde(default)]
    pub excluded_names: BTreeSet<String>,

    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_pattern() -> String {
    ".*".to_string()
}

fn default_depth() -> i32 {
    -1
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            pattern: default_pattern(),
            depth: default_depth(),
            stop_on_first_match: true,
            descend_into_matched_folder: false,
            excluded_names: BTreeSet::new(),
            case_sensitive: true,
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// A default configuration rooted at `root` looking for `pattern`.
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_stop_on_first_match(mut self, yes: bool) -> Self {
        self.stop_on_first_match = yes;
        self
    }

    pub fn with_descend_into_matched_folder(mut self, yes: bool) -> Self {
        self.descend_into_matched_folder = yes;
        self
    }

    pub fn with_case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// The depth limit as an option, `None` meaning unbounded.
    pub fn max_depth(&self) -> Option<usize> {
        usize::try_from(self.depth).ok()
    }

    /// Checks the invariants a search relies on.
    pub fn validate(&self) -> SearchResult<()> {
        if self.depth < -1 {
            return Err(SearchError::config_error(format!(
                "depth must be -1 or greater, got {}",
                self.depth
            )));
        }
        Ok(())
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("finder/config.yaml")),
            // Local config
            Some(PathBuf::from(".finder.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for (i, path) in config_files.iter().enumerate() {
            let Some(path) = path else { continue };
            // An explicit file must exist; the implicit ones are optional.
            let required = i == config_files.len() - 1;
            if required || path.exists() {
                builder = builder.add_source(File::from(path.as_path()).required(required));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(root) = cli.root {
            self.root = root;
        } else if cli.remote && self.root == default_root() {
            // The local working directory means nothing on a remote server;
            // an empty root starts from the session's own directory.
            self.root = PathBuf::new();
        }
        if let Some(pattern) = cli.pattern {
            self.pattern = pattern;
        }
        if let Some(depth) = cli.depth {
            self.depth = depth;
        }
        if cli.all_matches {
            self.stop_on_first_match = false;
        }
        if cli.descend_into_matched_folder {
            self.descend_into_matched_folder = true;
        }
        if cli.ignore_case {
            self.case_sensitive = false;
        }
        self.excluded_names.extend(cli.excluded_names);
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }
}

/// Values given explicitly on the command line. Unset fields keep whatever the
/// configuration files said.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub pattern: Option<String>,
    pub depth: Option<i32>,
    pub all_matches: bool,
    pub descend_into_matched_folder: bool,
    pub ignore_case: bool,
    pub excluded_names: Vec<String>,
    pub log_level: Option<String>,
    /// The root names a location on a remote server rather than a local path.
    pub remote: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            root: "/srv/data"
            pattern: "report_\\d+\\.csv$"
            depth: 2
            stop_on_first_match: false
            descend_into_matched_folder: true
            excluded_names: [".git", "target"]
            case_sensitive: false
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/data"));
        assert_eq!(config.pattern, r"report_\d+\.csv$");
        assert_eq!(config.depth, 2);
        assert!(!config.stop_on_first_match);
        assert!(config.descend_into_matched_folder);
        assert!(config.excluded_names.contains(".git"));
        assert!(config.excluded_names.contains("target"));
        assert!(!config.case_sensitive);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"root: \".\"\n").unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.pattern, ".*");
        assert_eq!(config.depth, -1);
        assert!(config.stop_on_first_match);
        assert!(!config.descend_into_matched_folder);
        assert!(config.excluded_names.is_empty());
        assert!(config.case_sensitive);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"depth: \"deep\"\nexcluded_names: 12\n")
            .unwrap();

        let result = SearchConfig::load_from(Some(&config_path));
        assert!(result.is_err(), "Expected error loading invalid config");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SearchConfig::load_from(Some(Path::new("nonexistent.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = SearchConfig::new("/srv", "old")
            .with_depth(3)
            .with_excluded([".git"]);

        let merged = file_config.clone().merge_with_cli(CliOverrides {
            pattern: Some("new".to_string()),
            all_matches: true,
            ignore_case: true,
            excluded_names: vec!["target".to_string()],
            ..CliOverrides::default()
        });

        assert_eq!(merged.root, PathBuf::from("/srv")); // File value
        assert_eq!(merged.pattern, "new"); // CLI value
        assert_eq!(merged.depth, 3); // File value
        assert!(!merged.stop_on_first_match);
        assert!(!merged.case_sensitive);
        assert_eq!(merged.excluded_names.len(), 2);

        let untouched = file_config.clone().merge_with_cli(CliOverrides::default());
        assert_eq!(untouched, file_config);
    }

    #[test]
    fn test_validate_depth() {
        assert!(SearchConfig::default().validate().is_ok());
        assert!(SearchConfig::default().with_depth(0).validate().is_ok());
        let err = SearchConfig::default().with_depth(-2).validate().unwrap_err();
        assert!(matches!(err, SearchError::ConfigError(_)));
    }

    #[test]
    fn test_max_depth() {
        assert_eq!(SearchConfig::default().max_depth(), None);
        assert_eq!(SearchConfig::default().with_depth(0).max_depth(), Some(0));
        assert_eq!(SearchConfig::default().with_depth(4).max_depth(), Some(4));
    }

    #[test]
    fn test_remote_search_drops_local_default_root() {
        let remote = || CliOverrides {
            remote: true,
            ..CliOverrides::default()
        };

        let merged = SearchConfig::default().merge_with_cli(remote());
        assert_eq!(merged.root, PathBuf::new());

        let from_file = SearchConfig::new("/pub", ".*").merge_with_cli(remote());
        assert_eq!(from_file.root, PathBuf::from("/pub"));

        let from_cli = SearchConfig::default().merge_with_cli(CliOverrides {
            root: Some(PathBuf::from("incoming")),
            ..remote()
        });
        assert_eq!(from_cli.root, PathBuf::from("incoming"));

        let local = SearchConfig::default().merge_with_cli(CliOverrides::default());
        assert_eq!(local.root, default_root());
    }
}
