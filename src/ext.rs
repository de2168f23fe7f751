//! # FileSystem Extension
//!
//! The factory surface of a backend: turning strings into [`Path`] handles and
//! anchoring cross-backend destination resolution.
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`get_path`](FileSystemExt::get_path) | Parse a string into a handle |
//! | [`integrate`](FileSystemExt::integrate) | Place a path's name inside a directory |
//! | [`copy`](FileSystemExt::copy) | Same as [`Path::copy_to`] |
//! | [`move_path`](FileSystemExt::move_path) | Same as [`Path::move_to`] |
//!
//! Implemented for [`SharedFs`], since handles need an owned back-reference to
//! their backend.

use std::sync::Arc;

use crate::{FsError, Path, SharedFs, transfer};

/// Factory methods available on every shared backend.
///
/// # Example
///
/// ```rust
/// use iofacade::{FileSystemExt, MemoryFs, SharedFs};
/// use std::sync::Arc;
///
/// let fs: SharedFs = Arc::new(MemoryFs::new());
/// let path = fs.get_path("docs/../readme.txt").unwrap();
/// assert_eq!(path.to_string(), "memory:/readme.txt");
/// ```
pub trait FileSystemExt {
    /// Parse `raw` with this backend's path syntax into a handle.
    ///
    /// No I/O is performed; the path need not exist.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if `raw` is not valid for this backend
    fn get_path(&self, raw: &str) -> Result<Path, FsError>;

    /// Location for `path`'s last segment inside `directory`.
    ///
    /// `directory` must belong to this backend instance; `path` may belong to
    /// any backend. Pure: nothing is checked on storage.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if `directory` belongs to another instance,
    ///   or `path` is a backend root (it has no name)
    fn integrate(&self, directory: &Path, path: &Path) -> Result<Path, FsError>;

    /// Copy `from` to `to`; see [`Path::copy_to`].
    fn copy(&self, from: &Path, to: &Path, overwrite: bool) -> Result<(), FsError> {
        from.copy_to(to, overwrite)
    }

    /// Move `from` to `to`; see [`Path::move_to`].
    fn move_path(&self, from: &Path, to: &Path, overwrite: bool) -> Result<(), FsError> {
        from.move_to(to, overwrite)
    }
}

impl FileSystemExt for SharedFs {
    fn get_path(&self, raw: &str) -> Result<Path, FsError> {
        let location = self.parse(raw)?;
        Ok(Path::new(Arc::clone(self), location))
    }

    fn integrate(&self, directory: &Path, path: &Path) -> Result<Path, FsError> {
        if !std::ptr::addr_eq(Arc::as_ptr(self), Arc::as_ptr(directory.file_system())) {
            return Err(FsError::InvalidPath {
                path: directory.location().to_path_buf(),
                reason: format!("directory belongs to another file system ({})", directory.backend_id()),
            });
        }
        transfer::integrate(directory, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFs;

    fn fs() -> SharedFs {
        Arc::new(MemoryFs::new())
    }

    #[test]
    fn get_path_parses_with_backend_syntax() {
        let fs = fs();
        let path = fs.get_path("a//b/./c").unwrap();
        assert_eq!(path.location(), std::path::Path::new("/a/b/c"));
        assert!(Arc::ptr_eq(path.file_system(), &fs));
        assert!(!path.exists().unwrap());
    }

    #[test]
    fn get_path_rejects_invalid_input() {
        assert!(matches!(
            fs().get_path(""),
            Err(FsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn integrate_across_backends() {
        let src_fs = fs();
        let dst_fs = fs();
        let source = src_fs.get_path("/a/b.txt").unwrap();
        let directory = dst_fs.get_path("/dst").unwrap();
        let result = dst_fs.integrate(&directory, &source).unwrap();
        assert_eq!(result, dst_fs.get_path("/dst/b.txt").unwrap());
        assert!(!result.exists().unwrap());
    }

    #[test]
    fn integrate_rejects_foreign_directory() {
        let a = fs();
        let b = fs();
        let directory = b.get_path("/dst").unwrap();
        let source = a.get_path("/f").unwrap();
        assert!(matches!(
            a.integrate(&directory, &source),
            Err(FsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn copy_and_move_pass_through() {
        let fs = fs();
        let src = fs.get_path("/src.txt").unwrap();
        src.as_file().unwrap().write_all(b"hello").unwrap();
        let copy = fs.get_path("/copy.txt").unwrap();
        fs.copy(&src, &copy, false).unwrap();
        let moved = fs.get_path("/moved.txt").unwrap();
        fs.move_path(&copy, &moved, false).unwrap();
        assert!(src.exists().unwrap());
        assert!(!copy.exists().unwrap());
        assert_eq!(moved.as_file().unwrap().read_all().unwrap(), b"hello");
    }
}
