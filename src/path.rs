//! Backend-agnostic handles: [`Path`] and its [`File`], [`Directory`] and
//! [`SymbolicLink`] views.
//!
//! A handle is only an identity (a backend plus a location inside it). It
//! owns no open resources, performs no I/O when constructed, and never caches
//! existence: every query goes to the backend. A handle goes stale, but stays
//! usable, when its location is deleted or moved away underneath it.
//!
//! ## Concurrency
//!
//! Handles carry no locks. Two callers copying into the same destination at
//! the same time race on the backend's own delete/create primitives and may
//! observe success, [`FsError::AlreadyExists`], or a silent overwrite.

use std::fmt;
use std::io::{Read, Write};
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use crate::filter::{IncludeAll, PathFilter};
use crate::{FileType, FsError, SharedFs, location, transfer, walk};

/// A location inside one backend.
///
/// Obtained from [`FileSystemExt::get_path`](crate::FileSystemExt::get_path)
/// or from directory listings.
///
/// Two handles are equal when they point at the same location of the same
/// backend *instance*.
#[derive(Clone)]
pub struct Path {
    fs: SharedFs,
    location: PathBuf,
}

impl Path {
    /// Build a handle for an already-parsed `location` of `fs`.
    ///
    /// The location is normalized lexically; nothing is checked on storage.
    pub fn new(fs: SharedFs, location: impl Into<PathBuf>) -> Self {
        let location = location::normalize(&location.into());
        Self { fs, location }
    }

    /// The backend this handle belongs to.
    pub fn file_system(&self) -> &SharedFs {
        &self.fs
    }

    /// The backend-kind tag used for native-vs-generic dispatch.
    pub fn backend_id(&self) -> &str {
        self.fs.id()
    }

    /// The backend location (absolute, normalized).
    pub fn location(&self) -> &std::path::Path {
        &self.location
    }

    /// Last segment of the location, or `None` for the backend root.
    ///
    /// Bytes that are not UTF-8 are shown as U+FFFD; [`location`](Self::location)
    /// keeps the segment as stored.
    pub fn name(&self) -> Option<String> {
        location::file_name(&self.location)
    }

    /// Handle of the parent location, or `None` for the backend root.
    pub fn parent(&self) -> Option<Path> {
        self.location
            .parent()
            .map(|parent| Path::new(Arc::clone(&self.fs), parent))
    }

    /// Whether both handles carry the same backend-kind tag.
    ///
    /// Differently configured instances of one backend kind count as the same
    /// backend.
    pub fn is_same_backend(&self, other: &Path) -> bool {
        self.fs.id() == other.fs.id()
    }

    /// Whether both handles belong to the very same backend instance.
    pub fn is_same_instance(&self, other: &Path) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.fs), Arc::as_ptr(&other.fs))
    }

    /// Kind of the entry, or `None` if nothing exists here.
    pub fn file_type(&self) -> Result<Option<FileType>, FsError> {
        self.fs.file_type(&self.location)
    }

    /// Whether anything exists at this location.
    pub fn exists(&self) -> Result<bool, FsError> {
        Ok(self.file_type()?.is_some())
    }

    /// Whether this is an existing regular file.
    pub fn is_file(&self) -> Result<bool, FsError> {
        Ok(self.file_type()? == Some(FileType::File))
    }

    /// Whether this is an existing directory.
    pub fn is_directory(&self) -> Result<bool, FsError> {
        Ok(self.file_type()? == Some(FileType::Directory))
    }

    /// Whether this is an existing symbolic link.
    pub fn is_symbolic_link(&self) -> Result<bool, FsError> {
        Ok(self.file_type()? == Some(FileType::Symlink))
    }

    /// View this path as a [`File`].
    ///
    /// An absent path may be viewed as a file (so it can be created).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotAFile`] if something other than a file exists here
    pub fn as_file(&self) -> Result<File, FsError> {
        match self.file_type()? {
            None | Some(FileType::File) => Ok(File(self.clone())),
            Some(_) => Err(FsError::NotAFile {
                path: self.location.clone(),
            }),
        }
    }

    /// View this path as a [`Directory`].
    ///
    /// An absent path may be viewed as a directory (so it can be created).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if something other than a directory exists here
    pub fn as_directory(&self) -> Result<Directory, FsError> {
        match self.file_type()? {
            None | Some(FileType::Directory) => Ok(Directory(self.clone())),
            Some(_) => Err(FsError::NotADirectory {
                path: self.location.clone(),
            }),
        }
    }

    /// View this path as a [`SymbolicLink`].
    ///
    /// An absent path may be viewed as a link (so it can be created).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotASymlink`] if something other than a symbolic link exists here
    pub fn as_symbolic_link(&self) -> Result<SymbolicLink, FsError> {
        match self.file_type()? {
            None | Some(FileType::Symlink) => Ok(SymbolicLink(self.clone())),
            Some(_) => Err(FsError::NotASymlink {
                path: self.location.clone(),
            }),
        }
    }

    /// Copy this entry to `dest`.
    ///
    /// Without `overwrite`, an existing directory `dest` receives the entry
    /// inside it under the entry's own name (like `cp src dir/`), and an
    /// occupied destination is an error. With `overwrite`, `dest` is used as
    /// given and cleared first.
    ///
    /// Same-backend copies use the backend's native copy; everything else is
    /// streamed entry by entry. Directory copies are not atomic: a failure
    /// leaves a partially populated destination.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if this entry does not exist
    /// - [`FsError::AlreadyExists`] if the effective destination is occupied and `overwrite` is false
    /// - [`FsError::InvalidPath`] if the destination is this entry, one of its ancestors, or lies inside it
    pub fn copy_to(&self, dest: &Path, overwrite: bool) -> Result<(), FsError> {
        transfer::copy(self, dest, overwrite)
    }

    /// Move this entry to `dest`.
    ///
    /// Destination rules are the same as for [`copy_to`](Self::copy_to).
    /// Across backends a move is a full copy followed by deleting the source;
    /// the source is only deleted once the copy has succeeded.
    ///
    /// # Errors
    ///
    /// Same as [`copy_to`](Self::copy_to).
    pub fn move_to(&self, dest: &Path, overwrite: bool) -> Result<(), FsError> {
        transfer::move_path(self, dest, overwrite)
    }

    /// Delete this entry; directories are deleted recursively.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing exists here
    pub fn delete(&self) -> Result<(), FsError> {
        if !self.exists()? {
            return Err(FsError::NotFound {
                path: self.location.clone(),
            });
        }
        self.fs.remove(&self.location)
    }

    /// Delete this entry if it exists. Absence is success.
    pub fn delete_if_exists(&self) -> Result<(), FsError> {
        if !self.exists()? {
            return Ok(());
        }
        match self.fs.remove(&self.location) {
            Err(FsError::NotFound { .. }) => Ok(()),
            other => other,
        }
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_instance(other) && self.location == other.location
    }
}

impl Eq for Path {}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.fs.id(), self.location.display())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("backend", &self.fs.id())
            .field("location", &self.location)
            .finish()
    }
}

/// A [`Path`] viewed as a regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File(Path);

impl File {
    /// Create the file, empty. The parent directory must exist.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if anything exists here
    pub fn create(&self) -> Result<(), FsError> {
        self.0.fs.create_file(&self.0.location)
    }

    /// Create the file unless something already exists here.
    pub fn create_if_not_exists(&self) -> Result<(), FsError> {
        if !self.0.exists()? {
            self.create()?;
        }
        Ok(())
    }

    /// Open a byte stream reading the file. Dropping the stream closes it.
    pub fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        self.0.fs.open_read(&self.0.location)
    }

    /// Open a byte stream writing the file, truncating it.
    ///
    /// Dropping the stream closes it; flush first to observe write errors.
    pub fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        self.0.fs.open_write(&self.0.location)
    }

    /// Read the whole file into memory.
    pub fn read_all(&self) -> Result<Vec<u8>, FsError> {
        let mut reader = self.open_read()?;
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| FsError::io("read", &self.0.location, e))?;
        Ok(data)
    }

    /// Replace the file's contents with `data`, creating the file if needed.
    pub fn write_all(&self, data: &[u8]) -> Result<(), FsError> {
        self.create_if_not_exists()?;
        let mut writer = self.open_write()?;
        writer
            .write_all(data)
            .and_then(|()| writer.flush())
            .map_err(|e| FsError::io("write", &self.0.location, e))
    }

    /// The underlying path.
    pub fn into_path(self) -> Path {
        self.0
    }
}

impl Deref for File {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

/// A [`Path`] viewed as a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory(Path);

impl Directory {
    /// Create the directory. The parent directory must exist.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if anything exists here
    pub fn create(&self) -> Result<(), FsError> {
        self.0.fs.create_dir(&self.0.location)
    }

    /// Create the directory unless something already exists here.
    pub fn create_if_not_exists(&self) -> Result<(), FsError> {
        if !self.0.exists()? {
            self.create()?;
        }
        Ok(())
    }

    /// All direct children, in backend listing order.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    pub fn list_entries(&self) -> Result<Vec<Path>, FsError> {
        self.list_entries_with(&IncludeAll)
    }

    /// Direct children for which `filter` answers
    /// [`Include`](crate::FilterResult::Include).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    pub fn list_entries_with(&self, filter: &dyn PathFilter) -> Result<Vec<Path>, FsError> {
        walk::list_entries(&self.0, filter)
    }

    /// All transitive descendants (the directory itself is not included).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    pub fn list_entries_recursive(&self) -> Result<Vec<Path>, FsError> {
        self.list_entries_recursive_with(&IncludeAll)
    }

    /// Filtered depth-first listing of all transitive descendants.
    ///
    /// For every visited entry the filter is evaluated once:
    ///
    /// - a directory answered `Include` or `ExcludeButDescend` is descended
    ///   into, and its descendants are collected before the directory itself;
    /// - a symbolic link answered `ExcludeButDescend` is followed when it
    ///   resolves to a directory in the same backend; traversal continues at
    ///   the target, reporting entries under the target's location, and no
    ///   directory is entered twice through links;
    /// - an entry is part of the result iff it was answered `Include`.
    ///
    /// Only links are deduplicated. A directory reachable both through a
    /// followed link and by ordinary descent is entered both ways, so its
    /// descendants appear in the result twice.
    ///
    /// The result is a fully materialized snapshot; sibling order is backend
    /// listing order. The walk aborts on the first backend failure.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist (checked before any filtering)
    pub fn list_entries_recursive_with(&self, filter: &dyn PathFilter) -> Result<Vec<Path>, FsError> {
        walk::list_entries_recursive(&self.0, filter)
    }

    /// The underlying path.
    pub fn into_path(self) -> Path {
        self.0
    }
}

impl Deref for Directory {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

/// A [`Path`] viewed as a symbolic link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicLink(Path);

impl SymbolicLink {
    /// The path this link points to, in the same backend.
    ///
    /// Relative targets are resolved against the link's parent directory.
    /// The target need not exist.
    pub fn read_link(&self) -> Result<Path, FsError> {
        let target = self.0.fs.read_link(&self.0.location)?;
        let resolved = location::resolve_link_target(&self.0.location, &target);
        Ok(Path::new(Arc::clone(&self.0.fs), resolved))
    }

    /// Create this link pointing at `target`, stored verbatim.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if anything exists here
    pub fn create(&self, target: &str) -> Result<(), FsError> {
        self.0
            .fs
            .symlink(std::path::Path::new(target), &self.0.location)
    }

    /// The underlying path.
    pub fn into_path(self) -> Path {
        self.0
    }
}

impl Deref for SymbolicLink {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
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
    fn new_normalizes_location() {
        let path = Path::new(fs(), "/a/./b/../c");
        assert_eq!(path.location(), std::path::Path::new("/a/c"));
        assert_eq!(path.name().as_deref(), Some("c"));
    }

    #[test]
    fn display_includes_backend_tag() {
        let path = Path::new(fs(), "/a/b");
        assert_eq!(path.to_string(), "memory:/a/b");
    }

    #[test]
    fn equality_is_per_instance() {
        let shared = fs();
        let a = Path::new(Arc::clone(&shared), "/x");
        let b = Path::new(shared, "/x");
        let c = Path::new(fs(), "/x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_same_backend(&c));
        assert!(!a.is_same_instance(&c));
    }

    #[test]
    fn absent_path_views_as_any_kind() {
        let path = Path::new(fs(), "/nothing");
        assert!(!path.exists().unwrap());
        assert!(path.as_file().is_ok());
        assert!(path.as_directory().is_ok());
        assert!(path.as_symbolic_link().is_ok());
    }

    #[test]
    fn existing_path_rejects_wrong_view() {
        let path = Path::new(fs(), "/dir");
        path.as_directory().unwrap().create().unwrap();
        assert!(matches!(path.as_file(), Err(FsError::NotAFile { .. })));
        assert!(matches!(
            path.as_symbolic_link(),
            Err(FsError::NotASymlink { .. })
        ));
        assert!(path.as_directory().is_ok());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let path = Path::new(fs(), "/missing");
        assert!(matches!(path.delete(), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn delete_if_exists_is_idempotent() {
        let path = Path::new(fs(), "/f");
        path.as_file().unwrap().write_all(b"x").unwrap();
        path.delete_if_exists().unwrap();
        path.delete_if_exists().unwrap();
        assert!(!path.exists().unwrap());
    }

    #[test]
    fn file_round_trips_bytes() {
        let file = Path::new(fs(), "/f.bin").as_file().unwrap();
        file.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(file.read_all().unwrap(), vec![1, 2, 3]);
        file.write_all(&[9]).unwrap();
        assert_eq!(file.read_all().unwrap(), vec![9]);
    }

    #[test]
    fn create_twice_is_already_exists() {
        let dir = Path::new(fs(), "/d").as_directory().unwrap();
        dir.create().unwrap();
        assert!(matches!(dir.create(), Err(FsError::AlreadyExists { .. })));
        dir.create_if_not_exists().unwrap();
    }

    #[test]
    fn read_link_resolves_relative_targets() {
        let shared = fs();
        Path::new(Arc::clone(&shared), "/d")
            .as_directory()
            .unwrap()
            .create()
            .unwrap();
        let link = Path::new(Arc::clone(&shared), "/d/link")
            .as_symbolic_link()
            .unwrap();
        link.create("../target").unwrap();
        assert_eq!(
            link.read_link().unwrap(),
            Path::new(shared, "/target")
        );
    }

    #[test]
    fn parent_of_root_is_none() {
        assert!(Path::new(fs(), "/").parent().is_none());
        assert_eq!(
            Path::new(fs(), "/a/b").parent().unwrap().location(),
            std::path::Path::new("/a")
        );
    }
}
