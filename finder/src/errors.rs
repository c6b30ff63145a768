/// Error types shared by the matcher, the backends and the search engine.
///
/// Every fallible operation returns [`SearchResult`]. Callers match on the
/// variant when they need to tell a bad pattern from an unreachable backend:
/// ```rust,ignore
/// match finder.find_files(&mut backend) {
///     Ok(paths) => // Zero paths is a valid answer, not an error,
///     Err(SearchError::InvalidPattern(p)) => // Fix the regex,
///     Err(SearchError::BackendAccess { location, .. }) => // Server or disk trouble,
///     Err(e) => // Anything else
/// }
/// ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Cannot access {location}: {message}")]
    BackendAccess { location: String, message: String },
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Search cancelled")]
    Cancelled,
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn backend_access(location: impl Into<String>, message: impl ToString) -> Self {
        Self::BackendAccess {
            location: location.into(),
            message: message.to_string(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an I/O failure on `path` to the most specific variant.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let path = Path::new("test.txt");
        let err = SearchError::file_not_found(path);
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::permission_denied(path);
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::invalid_pattern("(unclosed");
        assert!(matches!(err, SearchError::InvalidPattern(_)));

        let err = SearchError::backend_access("/pub", "550 No such directory");
        assert!(matches!(err, SearchError::BackendAccess { .. }));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::backend_access("/pub/data", "550 Permission denied");
        assert_eq!(
            err.to_string(),
            "Cannot access /pub/data: 550 Permission denied"
        );

        let err = SearchError::invalid_pattern("regex parse error".to_string());
        assert_eq!(err.to_string(), "Invalid pattern: regex parse error");

        let err = SearchError::config_error("depth must be -1 or greater".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: depth must be -1 or greater"
        );

        let err = SearchError::file_not_found("test.txt");
        assert_eq!(err.to_string(), "File not found: test.txt");

        assert_eq!(SearchError::Cancelled.to_string(), "Search cancelled");
    }

    #[test]
    fn test_from_io_kinds() {
        let path = Path::new("missing");
        let err = SearchError::from_io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::from_io(
            path,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"),
        );
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::from_io(path, std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert!(matches!(err, SearchError::IoError(_)));
    }
}
