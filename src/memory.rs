//! In-memory backend.
//!
//! Useful for tests and as a second backend kind next to [`LocalFs`](crate::LocalFs):
//! transfers between the two always take the generic path.

use std::any::Any;
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::{DirEntry, FileType, FsDir, FsError, FsLink, FsNative, FsRead, FsWrite, ReadDirIter};

type Nodes = BTreeMap<PathBuf, Node>;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
    Symlink(PathBuf),
}

impl Node {
    fn file_type(&self) -> FileType {
        match self {
            Node::File(_) => FileType::File,
            Node::Dir => FileType::Directory,
            Node::Symlink(_) => FileType::Symlink,
        }
    }
}

/// A backend that keeps everything in a map guarded by a `RwLock`.
///
/// The root directory `/` always exists. Every instance is independent; two
/// instances share the `"memory"` tag, so copies between them are native.
#[derive(Debug)]
pub struct MemoryFs {
    nodes: Arc<RwLock<Nodes>>,
}

impl MemoryFs {
    /// Backend-kind tag.
    pub const ID: &'static str = "memory";

    /// Create an empty filesystem containing only `/`.
    pub fn new() -> Self {
        let mut nodes = Nodes::new();
        nodes.insert(PathBuf::from("/"), Node::Dir);
        Self {
            nodes: Arc::new(RwLock::new(nodes)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Nodes>, FsError> {
        self.nodes.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Nodes>, FsError> {
        self.nodes.write().map_err(|_| poisoned())
    }

    fn node(&self, location: &Path) -> Result<Option<Node>, FsError> {
        Ok(self.read()?.get(location).cloned())
    }

    /// Copy of the subtree rooted at `location`, keyed relative to it.
    fn snapshot(&self, location: &Path) -> Result<Vec<(PathBuf, Node)>, FsError> {
        let nodes = self.read()?;
        if !nodes.contains_key(location) {
            return Err(FsError::NotFound {
                path: location.to_path_buf(),
            });
        }
        Ok(subtree(&nodes, location)
            .map(|(key, node)| (relative(key, location), node.clone()))
            .collect())
    }

    /// Insert a snapshot under `location`, which must be absent.
    fn graft(&self, location: &Path, snapshot: Vec<(PathBuf, Node)>) -> Result<(), FsError> {
        let mut nodes = self.write()?;
        require_vacant(&nodes, location, "copy")?;
        for (relative, node) in snapshot {
            nodes.insert(rebase(location, &relative), node);
        }
        Ok(())
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> FsError {
    FsError::Backend("memory backend lock poisoned".into())
}

fn subtree<'a>(nodes: &'a Nodes, location: &'a Path) -> impl Iterator<Item = (&'a PathBuf, &'a Node)> + 'a {
    nodes
        .range(location.to_path_buf()..)
        .take_while(move |(key, _)| key.starts_with(location))
}

fn relative(key: &Path, base: &Path) -> PathBuf {
    key.strip_prefix(base).map(Path::to_path_buf).unwrap_or_default()
}

fn rebase(base: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(relative)
    }
}

/// `location` must be absent and its parent an existing directory.
fn require_vacant(nodes: &Nodes, location: &Path, operation: &'static str) -> Result<(), FsError> {
    if nodes.contains_key(location) {
        return Err(FsError::AlreadyExists {
            path: location.to_path_buf(),
            operation,
        });
    }
    let parent = location.parent().unwrap_or_else(|| Path::new("/"));
    match nodes.get(parent) {
        Some(Node::Dir) => Ok(()),
        Some(_) => Err(FsError::NotADirectory {
            path: parent.to_path_buf(),
        }),
        None => Err(FsError::NotFound {
            path: parent.to_path_buf(),
        }),
    }
}

impl FsRead for MemoryFs {
    fn file_type(&self, location: &Path) -> Result<Option<FileType>, FsError> {
        Ok(self.read()?.get(location).map(Node::file_type))
    }

    fn open_read(&self, location: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        match self.node(location)? {
            Some(Node::File(data)) => Ok(Box::new(Cursor::new(data))),
            Some(_) => Err(FsError::NotAFile {
                path: location.to_path_buf(),
            }),
            None => Err(FsError::NotFound {
                path: location.to_path_buf(),
            }),
        }
    }
}

impl FsWrite for MemoryFs {
    fn create_file(&self, location: &Path) -> Result<(), FsError> {
        let mut nodes = self.write()?;
        require_vacant(&nodes, location, "create_file")?;
        nodes.insert(location.to_path_buf(), Node::File(Vec::new()));
        Ok(())
    }

    fn open_write(&self, location: &Path) -> Result<Box<dyn Write + Send>, FsError> {
        let mut nodes = self.write()?;
        match nodes.get_mut(location) {
            Some(Node::File(data)) => data.clear(),
            Some(_) => {
                return Err(FsError::NotAFile {
                    path: location.to_path_buf(),
                });
            }
            None => {
                return Err(FsError::NotFound {
                    path: location.to_path_buf(),
                });
            }
        }
        Ok(Box::new(MemoryWriter {
            nodes: Arc::clone(&self.nodes),
            location: location.to_path_buf(),
        }))
    }

    fn remove(&self, location: &Path) -> Result<(), FsError> {
        if location.parent().is_none() {
            return Err(FsError::InvalidPath {
                path: location.to_path_buf(),
                reason: "the root cannot be removed".into(),
            });
        }
        let mut nodes = self.write()?;
        if !nodes.contains_key(location) {
            return Err(FsError::NotFound {
                path: location.to_path_buf(),
            });
        }
        nodes.retain(|key, _| !key.starts_with(location));
        Ok(())
    }
}

impl FsDir for MemoryFs {
    fn read_dir(&self, location: &Path) -> Result<ReadDirIter, FsError> {
        let nodes = self.read()?;
        match nodes.get(location) {
            Some(Node::Dir) => {}
            Some(_) => {
                return Err(FsError::NotADirectory {
                    path: location.to_path_buf(),
                });
            }
            None => {
                return Err(FsError::NotFound {
                    path: location.to_path_buf(),
                });
            }
        }

        let entries = subtree(&nodes, location)
            .filter(|(key, _)| key.parent() == Some(location))
            .map(|(key, node)| {
                Ok(DirEntry {
                    name: crate::location::file_name(key).unwrap_or_default(),
                    path: key.clone(),
                    file_type: node.file_type(),
                })
            })
            .collect();
        Ok(ReadDirIter::from_vec(entries))
    }

    fn create_dir(&self, location: &Path) -> Result<(), FsError> {
        let mut nodes = self.write()?;
        require_vacant(&nodes, location, "create_dir")?;
        nodes.insert(location.to_path_buf(), Node::Dir);
        Ok(())
    }
}

impl FsLink for MemoryFs {
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError> {
        let mut nodes = self.write()?;
        require_vacant(&nodes, link, "symlink")?;
        nodes.insert(link.to_path_buf(), Node::Symlink(target.to_path_buf()));
        Ok(())
    }

    fn read_link(&self, location: &Path) -> Result<PathBuf, FsError> {
        match self.node(location)? {
            Some(Node::Symlink(target)) => Ok(target),
            Some(_) => Err(FsError::NotASymlink {
                path: location.to_path_buf(),
            }),
            None => Err(FsError::NotFound {
                path: location.to_path_buf(),
            }),
        }
    }
}

impl FsNative for MemoryFs {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "In-Memory Filesystem"
    }

    fn native_copy(&self, from: &crate::Path, to: &crate::Path) -> Result<(), FsError> {
        let Some(peer) = to.file_system().as_any().downcast_ref::<MemoryFs>() else {
            // Only links can leave this backend natively: recreate them verbatim.
            return match self.node(from.location())? {
                Some(Node::Symlink(target)) => to.file_system().symlink(&target, to.location()),
                _ => Err(FsError::NotSupported {
                    operation: "native_copy",
                }),
            };
        };
        let snapshot = self.snapshot(from.location())?;
        debug!(from = %from, to = %to, nodes = snapshot.len(), "memory copy");
        peer.graft(to.location(), snapshot)
    }

    fn native_move(&self, from: &crate::Path, to: &crate::Path) -> Result<(), FsError> {
        let Some(peer) = to.file_system().as_any().downcast_ref::<MemoryFs>() else {
            return Err(FsError::NotSupported {
                operation: "native_move",
            });
        };
        if !Arc::ptr_eq(&self.nodes, &peer.nodes) {
            self.native_copy(from, to)?;
            return self.remove(from.location());
        }

        let (src, dst) = (from.location(), to.location());
        let mut nodes = self.write()?;
        if !nodes.contains_key(src) {
            return Err(FsError::NotFound {
                path: src.to_path_buf(),
            });
        }
        require_vacant(&nodes, dst, "move")?;
        let moved: Vec<PathBuf> = subtree(&nodes, src).map(|(key, _)| key.clone()).collect();
        for key in moved {
            if let Some(node) = nodes.remove(&key) {
                nodes.insert(rebase(dst, &relative(&key, src)), node);
            }
        }
        debug!(from = %from, to = %to, "memory rename");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Appends to a file node under the lock on every write.
struct MemoryWriter {
    nodes: Arc<RwLock<Nodes>>,
    location: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| io::Error::other("memory backend lock poisoned"))?;
        match nodes.get_mut(&self.location) {
            Some(Node::File(data)) => {
                data.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is no longer a file", self.location.display()),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileSystemExt, SharedFs};

    fn p(s: &str) -> &Path {
        Path::new(s)
    }

    #[test]
    fn root_always_exists() {
        let fs = MemoryFs::new();
        assert_eq!(fs.file_type(p("/")).unwrap(), Some(FileType::Directory));
        assert!(matches!(fs.remove(p("/")), Err(FsError::InvalidPath { .. })));
    }

    #[test]
    fn create_requires_parent_directory() {
        let fs = MemoryFs::new();
        assert!(matches!(
            fs.create_file(p("/missing/f")),
            Err(FsError::NotFound { .. })
        ));
        fs.create_file(p("/f")).unwrap();
        assert!(matches!(
            fs.create_file(p("/f/g")),
            Err(FsError::NotADirectory { .. })
        ));
        assert!(matches!(
            fs.create_dir(p("/f")),
            Err(FsError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn writes_append_until_reopened() {
        let fs = MemoryFs::new();
        fs.create_file(p("/f")).unwrap();
        let mut w = fs.open_write(p("/f")).unwrap();
        w.write_all(b"ab").unwrap();
        w.write_all(b"cd").unwrap();
        drop(w);
        let mut out = String::new();
        fs.open_read(p("/f")).unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "abcd");

        drop(fs.open_write(p("/f")).unwrap());
        let mut out = Vec::new();
        fs.open_read(p("/f")).unwrap().read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn read_dir_lists_direct_children_only() {
        let fs = MemoryFs::new();
        fs.create_dir(p("/d")).unwrap();
        fs.create_dir(p("/d/sub")).unwrap();
        fs.create_file(p("/d/sub/deep")).unwrap();
        fs.create_file(p("/d/a")).unwrap();
        fs.create_file(p("/dz")).unwrap();
        let names: Vec<String> = fs
            .read_dir(p("/d"))
            .unwrap()
            .map(|e| e.unwrap().name)
            .collect();
        assert_eq!(names, ["a", "sub"]);
    }

    #[test]
    fn remove_is_recursive_and_exact() {
        let fs = MemoryFs::new();
        fs.create_dir(p("/d")).unwrap();
        fs.create_file(p("/d/a")).unwrap();
        fs.create_file(p("/dz")).unwrap();
        fs.remove(p("/d")).unwrap();
        assert_eq!(fs.file_type(p("/d/a")).unwrap(), None);
        assert_eq!(fs.file_type(p("/dz")).unwrap(), Some(FileType::File));
        assert!(matches!(fs.remove(p("/d")), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn links_store_targets_verbatim() {
        let fs = MemoryFs::new();
        fs.symlink(p("../x"), p("/l")).unwrap();
        assert_eq!(fs.read_link(p("/l")).unwrap(), PathBuf::from("../x"));
        assert_eq!(fs.file_type(p("/l")).unwrap(), Some(FileType::Symlink));
        assert!(matches!(
            fs.read_link(p("/")),
            Err(FsError::NotASymlink { .. })
        ));
    }

    #[test]
    fn native_copy_between_instances() {
        let a: SharedFs = Arc::new(MemoryFs::new());
        let b: SharedFs = Arc::new(MemoryFs::new());
        let src = a.get_path("/tree").unwrap();
        src.as_directory().unwrap().create().unwrap();
        a.get_path("/tree/f").unwrap().as_file().unwrap().write_all(b"1").unwrap();

        let dst = b.get_path("/copy").unwrap();
        a.native_copy(&src, &dst).unwrap();
        let copied = b.get_path("/copy/f").unwrap().as_file().unwrap();
        assert_eq!(copied.read_all().unwrap(), b"1");
        assert!(src.exists().unwrap());
    }

    #[test]
    fn native_move_within_instance_renames_subtree() {
        let fs: SharedFs = Arc::new(MemoryFs::new());
        let src = fs.get_path("/a").unwrap();
        src.as_directory().unwrap().create().unwrap();
        fs.get_path("/a/f").unwrap().as_file().unwrap().write_all(b"x").unwrap();
        let dst = fs.get_path("/b").unwrap();

        fs.native_move(&src, &dst).unwrap();
        assert!(!src.exists().unwrap());
        assert!(fs.get_path("/b/f").unwrap().is_file().unwrap());
    }

    #[test]
    fn writer_fails_once_file_is_gone() {
        let fs = MemoryFs::new();
        fs.create_file(p("/f")).unwrap();
        let mut w = fs.open_write(p("/f")).unwrap();
        fs.remove(p("/f")).unwrap();
        assert!(w.write_all(b"x").is_err());
    }
}
