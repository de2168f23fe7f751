//! Read operations for storage backends.

use std::io::Read;
use std::path::Path;

use crate::{FileType, FsError};

/// Read operations for a storage backend.
///
/// All methods use `&self` (interior mutability). Backends manage their own synchronization.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access. Backends should use interior mutability (`RwLock`, `Mutex`)
/// for thread-safe state management.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Kind of the entry at `location`, without following symbolic links.
    ///
    /// Returns `Ok(None)` if nothing exists there. Existence is computed on
    /// every call; backends must not cache it.
    ///
    /// # Errors
    ///
    /// Only for unexpected failures (e.g., I/O errors); absence is not an error.
    fn file_type(&self, location: &Path) -> Result<Option<FileType>, FsError>;

    /// Open a file for reading, returning a boxed reader.
    ///
    /// The stream is closed when the box is dropped.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the location does not exist
    /// - [`FsError::NotAFile`] if the location is a directory
    fn open_read(&self, location: &Path) -> Result<Box<dyn Read + Send>, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_read_is_object_safe() {
        fn _check(_: &dyn FsRead) {}
    }

    #[test]
    fn fs_read_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsRead>() {
            _assert_send_sync::<T>();
        }
    }
}
