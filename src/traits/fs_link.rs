//! Symbolic link operations.

use std::path::{Path, PathBuf};

use crate::FsError;

/// Symbolic link operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsLink`.
pub trait FsLink: Send + Sync {
    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// `target` is stored verbatim; it does not need to exist. Relative
    /// targets are resolved against the link's parent when read back.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if `link` already exists
    /// - [`FsError::NotFound`] if parent of `link` does not exist
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError>;

    /// Read the raw target of a symbolic link (not canonicalized).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `location` does not exist
    /// - [`FsError::NotASymlink`] if `location` is not a symbolic link
    /// - [`FsError::InvalidPath`] if the target cannot be expressed inside this backend
    fn read_link(&self, location: &Path) -> Result<PathBuf, FsError>;
}
