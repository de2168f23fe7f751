//! Error types for the IO facade.

use std::path::{Path, PathBuf};

/// Coarse classification of an [`FsError`].
///
/// Callers that only care about *what kind* of failure happened (rather than
/// which operation produced it) match on this instead of the full enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operation requires existence and the target is absent.
    NotFound,
    /// A non-overwriting operation's destination is occupied.
    AlreadyExists,
    /// A path was viewed as a kind (file, directory, link) it is not.
    UnsupportedConversion,
    /// A raw string or location could not be turned into a valid path.
    InvalidPath,
    /// The backend does not support the requested operation.
    NotSupported,
    /// Backend registration or configuration failed.
    Config,
    /// Any lower-level backend failure.
    Io,
}

/// Filesystem error type with contextual variants.
///
/// Locations are backend locations (the part after `<backend>:` in a
/// [`Path`](crate::Path)'s display form), not host paths.
///
/// # Examples
///
/// ```rust
/// use iofacade::{ErrorKind, FsError};
/// use std::path::PathBuf;
///
/// let err = FsError::NotFound { path: PathBuf::from("/missing") };
/// assert_eq!(err.to_string(), "not found: /missing");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: PathBuf,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a file but found something else.
    #[error("not a file: {path}")]
    NotAFile {
        /// The path that is not a file.
        path: PathBuf,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// Expected a symbolic link but found something else.
    #[error("not a symbolic link: {path}")]
    NotASymlink {
        /// The path that is not a symbolic link.
        path: PathBuf,
    },

    /// A raw path string or a computed location is not acceptable.
    #[error("invalid path: {path} ({reason})")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Operation is not supported by this backend.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// A required configuration property was not supplied and has no default.
    #[error("missing configuration property: {name}")]
    MissingProperty {
        /// The property name.
        name: String,
    },

    /// A configuration value has the wrong shape.
    #[error("invalid configuration property {name}: {details}")]
    InvalidConfig {
        /// The property name.
        name: String,
        /// What was wrong with it.
        details: String,
    },

    /// No backend with this id is registered.
    #[error("unknown backend: {id}")]
    UnknownBackend {
        /// The requested backend id.
        id: String,
    },

    /// A backend with this id is already registered.
    #[error("backend already registered: {id}")]
    DuplicateBackend {
        /// The conflicting backend id.
        id: String,
    },

    /// Generic backend error.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error that happened while running `operation` on `path`.
    ///
    /// `NotFound` and `AlreadyExists` I/O errors are lifted into the dedicated
    /// variants so callers can match on them without inspecting the source.
    pub fn io(operation: &'static str, path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
                path: path.to_path_buf(),
                operation,
            },
            _ => FsError::Io {
                operation,
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound { .. } => ErrorKind::NotFound,
            FsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            FsError::NotAFile { .. } | FsError::NotADirectory { .. } | FsError::NotASymlink { .. } => {
                ErrorKind::UnsupportedConversion
            }
            FsError::InvalidPath { .. } => ErrorKind::InvalidPath,
            FsError::NotSupported { .. } => ErrorKind::NotSupported,
            FsError::MissingProperty { .. }
            | FsError::InvalidConfig { .. }
            | FsError::UnknownBackend { .. }
            | FsError::DuplicateBackend { .. } => ErrorKind::Config,
            FsError::Backend(_) | FsError::Io { .. } => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        FsError::io("io", Path::new(""), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_not_found_display() {
        let err = FsError::NotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(err.to_string(), "not found: /missing");
    }

    #[test]
    fn fs_error_already_exists_display() {
        let err = FsError::AlreadyExists {
            path: PathBuf::from("/exists"),
            operation: "copy",
        };
        assert_eq!(err.to_string(), "copy: already exists: /exists");
    }

    #[test]
    fn conversion_errors_share_a_kind() {
        let path = PathBuf::from("/x");
        for err in [
            FsError::NotAFile { path: path.clone() },
            FsError::NotADirectory { path: path.clone() },
            FsError::NotASymlink { path },
        ] {
            assert_eq!(err.kind(), ErrorKind::UnsupportedConversion);
        }
    }

    #[test]
    fn io_lifts_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err = FsError::io("open", Path::new("/a"), io_err);
        match err {
            FsError::NotFound { path } => assert_eq!(path, PathBuf::from("/a")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn io_lifts_already_exists() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "test");
        let err = FsError::io("create_dir", Path::new("/a"), io_err);
        assert!(matches!(
            err,
            FsError::AlreadyExists {
                operation: "create_dir",
                ..
            }
        ));
    }

    #[test]
    fn permission_denied_is_an_io_failure() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err = FsError::io("open", Path::new("/secret"), io_err);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("/secret"));
    }

    #[test]
    fn from_io_other() {
        let io_err = std::io::Error::other("test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::Io { .. }));
    }

    #[test]
    fn config_errors_classify_as_config() {
        let err = FsError::UnknownBackend { id: "ftp".into() };
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.to_string(), "unknown backend: ftp");
    }
}
