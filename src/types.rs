//! Core types shared by every backend.

use std::path::PathBuf;

/// Kind of an existing filesystem entry.
///
/// The kinds are mutually exclusive: a symbolic link is reported as
/// [`FileType::Symlink`] regardless of what it points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
}

impl FileType {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(self) -> bool {
        self == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }

    /// Returns `true` if this is a symbolic link.
    #[inline]
    pub fn is_symlink(self) -> bool {
        self == FileType::Symlink
    }
}

/// A directory entry returned from `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DirEntry {
    /// Name of the entry (last segment only, not full location).
    pub name: String,
    /// Full backend location of the entry.
    pub path: PathBuf,
    /// Type of the entry.
    pub file_type: FileType,
}
