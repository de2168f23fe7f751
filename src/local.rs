//! Reference backend over the host filesystem.
//!
//! Every location is resolved beneath a configurable root directory, so a
//! `LocalFs` rooted at `/srv/data` sees `/srv/data/a.txt` as `/a.txt`.
//! Locations are normalized before they reach the backend and never climb
//! above the root.

use std::any::Any;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DirEntry, FileType, FsDir, FsError, FsLink, FsNative, FsRead, FsWrite, ReadDirIter};

/// Configuration of a [`LocalFs`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Host directory that backend location `/` maps to.
    pub root: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }
}

/// The host filesystem, seen through a root directory.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Backend-kind tag.
    pub const ID: &'static str = "local";

    /// A backend rooted at `root`. The directory is not checked.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A backend built from its configuration.
    pub fn from_config(config: LocalConfig) -> Self {
        Self::new(config.root)
    }

    /// Host directory backing location `/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path of a backend location.
    fn host(&self, location: &Path) -> PathBuf {
        beneath(&self.root, location)
    }

    fn require(&self, location: &Path, kind: FileType) -> Result<(), FsError> {
        match self.file_type(location)? {
            Some(found) if found == kind => Ok(()),
            None => Err(FsError::NotFound {
                path: location.to_path_buf(),
            }),
            Some(_) => Err(match kind {
                FileType::File => FsError::NotAFile {
                    path: location.to_path_buf(),
                },
                FileType::Directory => FsError::NotADirectory {
                    path: location.to_path_buf(),
                },
                FileType::Symlink => FsError::NotASymlink {
                    path: location.to_path_buf(),
                },
            }),
        }
    }

    /// Recursive copy into `peer`, recreating links with their backend targets.
    fn copy_tree(&self, peer: &LocalFs, from: &Path, to: &Path) -> Result<(), FsError> {
        match self.file_type(from)? {
            None => Err(FsError::NotFound {
                path: from.to_path_buf(),
            }),
            Some(FileType::Directory) => {
                peer.create_dir(to)?;
                for entry in self.read_dir(from)?.collect_all()? {
                    let Some(name) = entry.path.file_name() else {
                        continue;
                    };
                    self.copy_tree(peer, &entry.path, &to.join(name))?;
                }
                Ok(())
            }
            Some(FileType::File) => {
                if peer.file_type(to)?.is_some() {
                    return Err(FsError::AlreadyExists {
                        path: to.to_path_buf(),
                        operation: "copy",
                    });
                }
                fs::copy(self.host(from), peer.host(to))
                    .map(|_| ())
                    .map_err(|e| FsError::io("copy", from, e))
            }
            Some(FileType::Symlink) => {
                let target = self.read_link(from)?;
                peer.symlink(&target, to)
            }
        }
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::from_config(LocalConfig::default())
    }
}

fn beneath(root: &Path, location: &Path) -> PathBuf {
    let relative = location.strip_prefix("/").unwrap_or(location);
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

fn host_file_type(file_type: fs::FileType) -> FileType {
    if file_type.is_symlink() {
        FileType::Symlink
    } else if file_type.is_dir() {
        FileType::Directory
    } else {
        FileType::File
    }
}

impl FsRead for LocalFs {
    fn file_type(&self, location: &Path) -> Result<Option<FileType>, FsError> {
        match fs::symlink_metadata(self.host(location)) {
            Ok(meta) => Ok(Some(host_file_type(meta.file_type()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FsError::io("metadata", location, e)),
        }
    }

    fn open_read(&self, location: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        self.require(location, FileType::File)?;
        let file = fs::File::open(self.host(location)).map_err(|e| FsError::io("open", location, e))?;
        Ok(Box::new(file))
    }
}

impl FsWrite for LocalFs {
    fn create_file(&self, location: &Path) -> Result<(), FsError> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.host(location))
            .map(drop)
            .map_err(|e| FsError::io("create_file", location, e))
    }

    fn open_write(&self, location: &Path) -> Result<Box<dyn Write + Send>, FsError> {
        self.require(location, FileType::File)?;
        let file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.host(location))
            .map_err(|e| FsError::io("open", location, e))?;
        Ok(Box::new(file))
    }

    fn remove(&self, location: &Path) -> Result<(), FsError> {
        if location.parent().is_none() {
            return Err(FsError::InvalidPath {
                path: location.to_path_buf(),
                reason: "the root cannot be removed".into(),
            });
        }
        let host = self.host(location);
        match self.file_type(location)? {
            None => Err(FsError::NotFound {
                path: location.to_path_buf(),
            }),
            Some(FileType::Directory) => {
                debug!(path = %host.display(), "removing directory tree");
                fs::remove_dir_all(&host).map_err(|e| FsError::io("remove_dir_all", location, e))
            }
            Some(_) => fs::remove_file(&host).map_err(|e| FsError::io("remove_file", location, e)),
        }
    }
}

impl FsDir for LocalFs {
    fn read_dir(&self, location: &Path) -> Result<ReadDirIter, FsError> {
        self.require(location, FileType::Directory)?;
        let entries =
            fs::read_dir(self.host(location)).map_err(|e| FsError::io("read_dir", location, e))?;

        let base = location.to_path_buf();
        Ok(ReadDirIter::new(entries.map(move |entry| {
            let entry = entry.map_err(|e| FsError::io("read_dir", &base, e))?;
            let file_name = entry.file_name();
            let path = base.join(&file_name);
            let name = file_name.to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .map(host_file_type)
                .map_err(|e| FsError::io("read_dir", &path, e))?;
            Ok(DirEntry {
                name,
                path,
                file_type,
            })
        })))
    }

    fn create_dir(&self, location: &Path) -> Result<(), FsError> {
        let host = self.host(location);
        debug!(path = %host.display(), "creating directory");
        fs::create_dir(&host).map_err(|e| FsError::io("create_dir", location, e))
    }
}

impl FsLink for LocalFs {
    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError> {
        // Absolute targets are backend locations; store them as host paths.
        let stored = if target.has_root() {
            self.host(target)
        } else {
            target.to_path_buf()
        };
        std::os::unix::fs::symlink(stored, self.host(link)).map_err(|e| FsError::io("symlink", link, e))
    }

    #[cfg(not(unix))]
    fn symlink(&self, _target: &Path, _link: &Path) -> Result<(), FsError> {
        Err(FsError::NotSupported { operation: "symlink" })
    }

    fn read_link(&self, location: &Path) -> Result<PathBuf, FsError> {
        self.require(location, FileType::Symlink)?;
        let target =
            fs::read_link(self.host(location)).map_err(|e| FsError::io("read_link", location, e))?;
        if !target.has_root() {
            return Ok(target);
        }
        match target.strip_prefix(&self.root) {
            Ok(inside) => Ok(Path::new("/").join(inside)),
            Err(_) => Err(FsError::InvalidPath {
                path: target,
                reason: format!("link target lies outside the root {}", self.root.display()),
            }),
        }
    }
}

impl FsNative for LocalFs {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Local Filesystem"
    }

    /// The host path, with the root canonicalized when it exists.
    fn storage_location(&self, location: &Path) -> Option<PathBuf> {
        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        Some(beneath(&root, location))
    }

    fn native_copy(&self, from: &crate::Path, to: &crate::Path) -> Result<(), FsError> {
        match to.file_system().as_any().downcast_ref::<LocalFs>() {
            Some(peer) => {
                debug!(from = %from, to = %to, "local copy");
                self.copy_tree(peer, from.location(), to.location())
            }
            // Only links can leave this backend natively: recreate them verbatim.
            None if self.file_type(from.location())? == Some(FileType::Symlink) => {
                let target = self.read_link(from.location())?;
                to.file_system().symlink(&target, to.location())
            }
            None => Err(FsError::NotSupported {
                operation: "native_copy",
            }),
        }
    }

    fn native_move(&self, from: &crate::Path, to: &crate::Path) -> Result<(), FsError> {
        let Some(peer) = to.file_system().as_any().downcast_ref::<LocalFs>() else {
            return Err(FsError::NotSupported {
                operation: "native_move",
            });
        };
        let (src, dst) = (self.host(from.location()), peer.host(to.location()));
        match fs::rename(&src, &dst) {
            Ok(()) => {
                debug!(from = %from, to = %to, "local rename");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                debug!(from = %from, to = %to, "rename crosses devices, copying");
                self.copy_tree(peer, from.location(), to.location())?;
                self.remove(from.location())
            }
            Err(e) => Err(FsError::io("rename", from.location(), e)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
