//! Lexical handling of backend locations.
//!
//! A location is the backend-side identity of a [`Path`](crate::Path): an
//! absolute, `/`-rooted, normalized path inside the backend's namespace. The
//! helpers here never touch storage.

use std::path::{Component, Path, PathBuf};

use crate::FsError;

/// Parse a raw, `/`-separated path string into a normalized location.
///
/// Relative input is taken relative to the backend root. `.` segments and
/// repeated separators are dropped; `..` climbs one level but never above the
/// root, so every result stays inside the backend.
///
/// # Errors
///
/// - [`FsError::InvalidPath`] if `raw` is empty or contains a NUL byte
///
/// # Example
///
/// ```rust
/// use iofacade::location;
/// use std::path::PathBuf;
///
/// assert_eq!(location::parse("a//b/./c").unwrap(), PathBuf::from("/a/b/c"));
/// assert_eq!(location::parse("/../../etc").unwrap(), PathBuf::from("/etc"));
/// ```
pub fn parse(raw: &str) -> Result<PathBuf, FsError> {
    if raw.is_empty() {
        return Err(FsError::InvalidPath {
            path: PathBuf::new(),
            reason: "empty path".into(),
        });
    }
    if raw.contains('\0') {
        return Err(FsError::InvalidPath {
            path: PathBuf::from(raw.replace('\0', "\\0")),
            reason: "contains NUL byte".into(),
        });
    }

    let mut location = PathBuf::from("/");
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                location.pop();
            }
            name => location.push(name),
        }
    }
    Ok(location)
}

/// Lexically normalize a location: resolve `.` and `..`, root the result.
///
/// Does NOT follow symlinks.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::from("/");

    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(name) => {
                normalized.push(name);
            }
        }
    }

    normalized
}

/// Resolve a symbolic link target relative to the link's own location.
///
/// Absolute targets are taken as-is (in the link's backend); relative targets
/// are joined onto the link's parent.
pub fn resolve_link_target(link: &Path, target: &Path) -> PathBuf {
    if target.has_root() {
        normalize(target)
    } else {
        let parent = link.parent().unwrap_or_else(|| Path::new("/"));
        normalize(&parent.join(target))
    }
}

/// Last segment of a location as UTF-8 (invalid bytes replaced), or `None`
/// for the root.
///
/// For display and name matching only; join with [`Path::file_name`].
pub fn file_name(location: &Path) -> Option<String> {
    location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Returns `true` if `location` equals `ancestor` or lies beneath it.
pub fn is_within(location: &Path, ancestor: &Path) -> bool {
    location.starts_with(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roots_relative_input() {
        assert_eq!(parse("a/b").unwrap(), PathBuf::from("/a/b"));
        assert_eq!(parse("/a/b").unwrap(), PathBuf::from("/a/b"));
    }

    #[test]
    fn parse_collapses_dots_and_slashes() {
        assert_eq!(parse("//a/./b//c/").unwrap(), PathBuf::from("/a/b/c"));
        assert_eq!(parse("a/b/../c").unwrap(), PathBuf::from("/a/c"));
    }

    #[test]
    fn parse_never_escapes_root() {
        assert_eq!(parse("../../x").unwrap(), PathBuf::from("/x"));
        assert_eq!(parse("/..").unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(parse(""), Err(FsError::InvalidPath { .. })));
    }

    #[test]
    fn parse_rejects_nul() {
        assert!(matches!(parse("a\0b"), Err(FsError::InvalidPath { .. })));
    }

    #[test]
    fn normalize_handles_parent_dirs() {
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("a/./b")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/../..")), PathBuf::from("/"));
    }

    #[test]
    fn link_target_resolution() {
        let link = Path::new("/dir/link");
        assert_eq!(
            resolve_link_target(link, Path::new("../other")),
            PathBuf::from("/other")
        );
        assert_eq!(
            resolve_link_target(link, Path::new("sub")),
            PathBuf::from("/dir/sub")
        );
        assert_eq!(
            resolve_link_target(link, Path::new("/abs/t")),
            PathBuf::from("/abs/t")
        );
    }

    #[test]
    fn file_name_of_root_is_none() {
        assert_eq!(file_name(Path::new("/")), None);
        assert_eq!(file_name(Path::new("/a/b.txt")).as_deref(), Some("b.txt"));
    }

    #[test]
    fn within_is_component_wise() {
        assert!(is_within(Path::new("/a/b"), Path::new("/a")));
        assert!(is_within(Path::new("/a"), Path::new("/a")));
        assert!(!is_within(Path::new("/ab"), Path::new("/a")));
    }
}
