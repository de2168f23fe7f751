//! Filtered directory listing and recursive traversal.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::trace;

use crate::filter::{FilterResult, PathFilter};
use crate::{FileType, FsError, Path, location};

/// Longest symbolic link chain followed before giving up on a link.
const MAX_LINK_DEPTH: usize = 40;

fn require_directory(directory: &Path) -> Result<(), FsError> {
    match directory.file_type()? {
        Some(FileType::Directory) => Ok(()),
        None => Err(FsError::NotFound {
            path: directory.location().to_path_buf(),
        }),
        Some(_) => Err(FsError::NotADirectory {
            path: directory.location().to_path_buf(),
        }),
    }
}

fn children(directory: &Path) -> Result<Vec<Path>, FsError> {
    let fs = directory.file_system();
    Ok(fs
        .read_dir(directory.location())?
        .collect_all()?
        .into_iter()
        .map(|entry| Path::new(Arc::clone(fs), entry.path))
        .collect())
}

pub(crate) fn list_entries(directory: &Path, filter: &dyn PathFilter) -> Result<Vec<Path>, FsError> {
    require_directory(directory)?;
    Ok(children(directory)?
        .into_iter()
        .filter(|child| filter.apply(child).includes())
        .collect())
}

pub(crate) fn list_entries_recursive(
    directory: &Path,
    filter: &dyn PathFilter,
) -> Result<Vec<Path>, FsError> {
    require_directory(directory)?;

    let mut walk = Walk {
        filter,
        visited: HashSet::new(),
        out: Vec::new(),
    };
    walk.visited.insert(directory.location().to_path_buf());
    walk.descend(directory)?;

    trace!(root = %directory, entries = walk.out.len(), "recursive listing done");
    Ok(walk.out)
}

struct Walk<'f> {
    filter: &'f dyn PathFilter,
    /// Every directory whose children have been (or are being) listed.
    visited: HashSet<PathBuf>,
    out: Vec<Path>,
}

impl Walk<'_> {
    fn descend(&mut self, directory: &Path) -> Result<(), FsError> {
        for child in children(directory)? {
            let verdict = self.filter.apply(&child);
            match child.file_type()? {
                Some(FileType::Directory) if verdict.descends() => {
                    self.visited.insert(child.location().to_path_buf());
                    self.descend(&child)?;
                }
                Some(FileType::Symlink) if verdict == FilterResult::ExcludeButDescend => {
                    self.follow(&child)?;
                }
                // Vanished between listing and inspection.
                None => continue,
                _ => {}
            }
            if verdict.includes() {
                self.out.push(child);
            }
        }
        Ok(())
    }

    fn follow(&mut self, link: &Path) -> Result<(), FsError> {
        let Some(target) = resolve_link_chain(link)? else {
            trace!(%link, "not following link");
            return Ok(());
        };
        if !self.visited.insert(target.location().to_path_buf()) {
            trace!(%link, target = %target, "link target already visited");
            return Ok(());
        }
        trace!(%link, target = %target, "following link");
        self.descend(&target)
    }
}

/// Resolve `link` through any chain of links to a directory in the same
/// backend. Dangling links, links to files and over-long chains yield `None`.
fn resolve_link_chain(link: &Path) -> Result<Option<Path>, FsError> {
    let fs = link.file_system();
    let mut current = link.location().to_path_buf();
    for _ in 0..MAX_LINK_DEPTH {
        let raw = fs.read_link(&current)?;
        current = location::resolve_link_target(&current, &raw);
        match fs.file_type(&current)? {
            Some(FileType::Symlink) => continue,
            Some(FileType::Directory) => return Ok(Some(Path::new(Arc::clone(fs), current))),
            Some(FileType::File) | None => return Ok(None),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IncludeAll, MemoryFs, SharedFs};

    fn tree() -> (SharedFs, Path) {
        let fs: SharedFs = Arc::new(MemoryFs::new());
        for dir in ["/r", "/r/sub", "/r/sub/deep"] {
            Path::new(Arc::clone(&fs), dir)
                .as_directory()
                .unwrap()
                .create()
                .unwrap();
        }
        for file in ["/r/a.txt", "/r/sub/b.txt", "/r/sub/deep/c.log"] {
            Path::new(Arc::clone(&fs), file)
                .as_file()
                .unwrap()
                .write_all(b"x")
                .unwrap();
        }
        let root = Path::new(Arc::clone(&fs), "/r");
        (fs, root)
    }

    fn locations(paths: &[Path]) -> Vec<String> {
        let mut out: Vec<String> = paths
            .iter()
            .map(|p| p.location().display().to_string())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn missing_root_is_not_found_before_filtering() {
        let fs: SharedFs = Arc::new(MemoryFs::new());
        let called = std::cell::Cell::new(false);
        let filter = |_: &Path| {
            called.set(true);
            FilterResult::Include
        };
        let err = list_entries_recursive(&Path::new(fs, "/nope"), &filter).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
        assert!(!called.get());
    }

    #[test]
    fn file_root_is_not_a_directory() {
        let (fs, _) = tree();
        let err = list_entries(&Path::new(fs, "/r/a.txt"), &IncludeAll).unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));
    }

    #[test]
    fn include_all_lists_everything_but_root() {
        let (_, root) = tree();
        let all = list_entries_recursive(&root, &IncludeAll).unwrap();
        assert_eq!(
            locations(&all),
            [
                "/r/a.txt",
                "/r/sub",
                "/r/sub/b.txt",
                "/r/sub/deep",
                "/r/sub/deep/c.log"
            ]
        );
    }

    #[test]
    fn descendants_come_before_their_directory() {
        let (_, root) = tree();
        let all = list_entries_recursive(&root, &IncludeAll).unwrap();
        let position = |loc: &str| {
            all.iter()
                .position(|p| p.location() == std::path::Path::new(loc))
                .unwrap()
        };
        assert!(position("/r/sub/b.txt") < position("/r/sub"));
        assert!(position("/r/sub/deep/c.log") < position("/r/sub/deep"));
        assert!(position("/r/sub/deep") < position("/r/sub"));
    }

    #[test]
    fn excluded_directory_is_pruned() {
        let (_, root) = tree();
        let filter = |p: &Path| FilterResult::from(p.name().as_deref() != Some("sub"));
        let found = list_entries_recursive(&root, &filter).unwrap();
        assert_eq!(locations(&found), ["/r/a.txt"]);
    }

    #[test]
    fn exclude_but_descend_hides_only_the_directory() {
        let (_, root) = tree();
        let filter = |p: &Path| {
            if p.is_directory().unwrap() {
                FilterResult::ExcludeButDescend
            } else {
                FilterResult::Include
            }
        };
        let found = list_entries_recursive(&root, &filter).unwrap();
        assert_eq!(
            locations(&found),
            ["/r/a.txt", "/r/sub/b.txt", "/r/sub/deep/c.log"]
        );
    }

    #[test]
    fn filter_runs_once_per_visited_entry() {
        let (_, root) = tree();
        let calls = std::cell::Cell::new(0);
        let filter = |_: &Path| {
            calls.set(calls.get() + 1);
            FilterResult::Include
        };
        list_entries_recursive(&root, &filter).unwrap();
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn flat_listing_applies_filter_to_children_only() {
        let (_, root) = tree();
        let filter = |p: &Path| FilterResult::from(p.is_file().unwrap());
        let found = list_entries(&root, &filter).unwrap();
        assert_eq!(locations(&found), ["/r/a.txt"]);
    }

    #[test]
    fn exclude_but_descend_follows_directory_links() {
        let (fs, root) = tree();
        Path::new(Arc::clone(&fs), "/r/to_sub")
            .as_symbolic_link()
            .unwrap()
            .create("/r/sub/deep")
            .unwrap();
        // Everything but `sub` itself; links are followed, not listed.
        let filter = |p: &Path| {
            if p.name().as_deref() == Some("sub") {
                FilterResult::Exclude
            } else if p.is_symbolic_link().unwrap() {
                FilterResult::ExcludeButDescend
            } else {
                FilterResult::Include
            }
        };
        let found = list_entries_recursive(&root, &filter).unwrap();
        assert_eq!(locations(&found), ["/r/a.txt", "/r/sub/deep/c.log"]);
    }

    #[test]
    fn link_cycles_terminate() {
        let (fs, root) = tree();
        Path::new(Arc::clone(&fs), "/r/sub/deep/back")
            .as_symbolic_link()
            .unwrap()
            .create("../..")
            .unwrap();
        let filter = |p: &Path| {
            if p.is_symbolic_link().unwrap() {
                FilterResult::ExcludeButDescend
            } else {
                FilterResult::Include
            }
        };
        let found = list_entries_recursive(&root, &filter).unwrap();
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn directory_reached_by_link_and_descent_is_reported_twice() {
        let (fs, root) = tree();
        // Sorts before `sub`, so the link is followed first.
        Path::new(Arc::clone(&fs), "/r/a_link")
            .as_symbolic_link()
            .unwrap()
            .create("sub")
            .unwrap();
        let filter = |p: &Path| {
            if p.is_symbolic_link().unwrap() {
                FilterResult::ExcludeButDescend
            } else {
                FilterResult::Include
            }
        };
        let found = list_entries_recursive(&root, &filter).unwrap();
        let count = |loc: &str| {
            found
                .iter()
                .filter(|p| p.location() == std::path::Path::new(loc))
                .count()
        };
        assert_eq!(count("/r/sub/b.txt"), 2);
        assert_eq!(count("/r/sub/deep/c.log"), 2);
        assert_eq!(count("/r/sub"), 1);
    }

    #[test]
    fn dangling_and_file_links_are_skipped() {
        let (fs, root) = tree();
        for (name, target) in [("dangling", "/nowhere"), ("to_file", "a.txt")] {
            Path::new(Arc::clone(&fs), format!("/r/{name}"))
                .as_symbolic_link()
                .unwrap()
                .create(target)
                .unwrap();
        }
        let filter = |p: &Path| {
            if p.is_symbolic_link().unwrap() {
                FilterResult::ExcludeButDescend
            } else {
                FilterResult::Include
            }
        };
        let found = list_entries_recursive(&root, &filter).unwrap();
        assert_eq!(found.len(), 5);
    }
}
