//! Write operations for storage backends.

use std::io::Write;
use std::path::Path;

use crate::FsError;

/// Write operations for a storage backend.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access. Nothing here serializes concurrent writers to the same
/// location; two callers racing on one destination get whatever the backend's
/// own primitives produce.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Create an empty file. The parent directory must exist.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if anything exists at `location`
    /// - [`FsError::NotFound`] if the parent directory does not exist
    fn create_file(&self, location: &Path) -> Result<(), FsError>;

    /// Open a file for writing (truncating), returning a boxed writer.
    ///
    /// The stream is closed when the box is dropped; callers flush before
    /// dropping to observe write errors.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent directory does not exist
    /// - [`FsError::NotAFile`] if the location is a directory
    fn open_write(&self, location: &Path) -> Result<Box<dyn Write + Send>, FsError>;

    /// Remove whatever is at `location`; directories are removed recursively.
    ///
    /// Symbolic links are removed themselves, never their targets.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the location does not exist
    fn remove(&self, location: &Path) -> Result<(), FsError>;
}
