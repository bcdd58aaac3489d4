//! Load-time error taxonomy.
//!
//! Every input file (matrix, permutation, labels) is read before the
//! interactive loop starts, so all of these are fatal to startup.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading matrix, permutation or label files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input path does not exist.
    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but its contents are malformed.
    #[error("{}:{line}: {message}", path.display())]
    ParseError {
        path: PathBuf,
        /// 1-based line number, or 0 when the error is not tied to a line.
        line: usize,
        message: String,
    },

    /// A permutation or label file has the wrong number of entries.
    #[error("{} contains {found} {what}, expected {expected}", path.display())]
    SizeMismatch {
        path: PathBuf,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Any other I/O failure (permissions, truncated gzip stream, ...).
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn parse(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound {
                path: path.to_path_buf(),
            };
        }
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_message() {
        let err = LoadError::SizeMismatch {
            path: PathBuf::from("rows.perm"),
            what: "entries",
            expected: 10,
            found: 7,
        };
        assert_eq!(err.to_string(), "rows.perm contains 7 entries, expected 10");
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = LoadError::io(Path::new("missing.smat"), source);
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}
