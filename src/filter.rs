//! Three-valued path filters for listing and traversal.
//!
//! A filter answers, for every visited entry, one of:
//!
//! | Result | Entry in output | Descend (directories) |
//! |--------|-----------------|-----------------------|
//! | [`FilterResult::Include`] | yes | yes |
//! | [`FilterResult::Exclude`] | no | no |
//! | [`FilterResult::ExcludeButDescend`] | no | yes |
//!
//! For files, `ExcludeButDescend` behaves like `Exclude`. For symbolic links,
//! `ExcludeButDescend` follows the link (see
//! [`Directory::list_entries_recursive_with`](crate::Directory::list_entries_recursive_with)).

use glob::{MatchOptions, Pattern};
use tracing::warn;

use crate::{FsError, Path};

/// Outcome of applying a [`PathFilter`] to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FilterResult {
    /// Keep the entry (and descend into it if it is a directory).
    Include,
    /// Drop the entry and everything beneath it.
    Exclude,
    /// Drop the entry itself but keep looking beneath it.
    ExcludeButDescend,
}

impl FilterResult {
    /// Whether the entry itself belongs in the result.
    #[inline]
    pub fn includes(self) -> bool {
        self == FilterResult::Include
    }

    /// Whether traversal continues beneath the entry.
    #[inline]
    pub fn descends(self) -> bool {
        matches!(self, FilterResult::Include | FilterResult::ExcludeButDescend)
    }
}

impl From<bool> for FilterResult {
    fn from(include: bool) -> Self {
        if include {
            FilterResult::Include
        } else {
            FilterResult::Exclude
        }
    }
}

/// A pure predicate over paths, evaluated once per visited entry.
///
/// Implemented for every `Fn(&Path) -> FilterResult` closure:
///
/// ```rust
/// use iofacade::{FilterResult, Path, PathFilter};
///
/// fn only_txt(path: &Path) -> FilterResult {
///     path.name().is_some_and(|n| n.ends_with(".txt")).into()
/// }
///
/// fn takes_filter(_: &dyn PathFilter) {}
/// takes_filter(&only_txt);
/// ```
pub trait PathFilter {
    /// Classify `path`.
    fn apply(&self, path: &Path) -> FilterResult;
}

impl<F> PathFilter for F
where
    F: Fn(&Path) -> FilterResult,
{
    fn apply(&self, path: &Path) -> FilterResult {
        self(path)
    }
}

/// The default filter: includes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeAll;

impl PathFilter for IncludeAll {
    fn apply(&self, _: &Path) -> FilterResult {
        FilterResult::Include
    }
}

/// Includes entries whose name matches a glob pattern.
///
/// Non-matching directories are answered with
/// [`ExcludeButDescend`](FilterResult::ExcludeButDescend) so matches deeper in
/// the tree are still found; other non-matching entries are excluded.
///
/// A non-matching entry whose kind cannot be read is excluded as well, which
/// prunes it if it is a directory. The backend error is absorbed and logged
/// at `warn`.
///
/// ```rust
/// use iofacade::GlobFilter;
///
/// let filter = GlobFilter::new("*.txt").unwrap();
/// assert_eq!(filter.pattern(), "*.txt");
/// ```
#[derive(Debug, Clone)]
pub struct GlobFilter {
    pattern: Pattern,
    options: MatchOptions,
}

impl GlobFilter {
    /// Compile `pattern` (matched against the entry name only).
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if the pattern is malformed
    pub fn new(pattern: &str) -> Result<Self, FsError> {
        let pattern = Pattern::new(pattern).map_err(|e| FsError::InvalidPath {
            path: pattern.into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            options: MatchOptions {
                case_sensitive: true,
                require_literal_separator: true,
                require_literal_leading_dot: false,
            },
        })
    }

    /// Match names case-insensitively.
    pub fn case_insensitive(mut self) -> Self {
        self.options.case_sensitive = false;
        self
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn matches_name(&self, name: &str) -> bool {
        self.pattern.matches_with(name, self.options)
    }
}

impl PathFilter for GlobFilter {
    fn apply(&self, path: &Path) -> FilterResult {
        let matched = path.name().is_some_and(|name| self.matches_name(&name));
        if matched {
            return FilterResult::Include;
        }
        match path.is_directory() {
            Ok(true) => FilterResult::ExcludeButDescend,
            Ok(false) => FilterResult::Exclude,
            Err(e) => {
                warn!(%path, error = %e, "cannot read entry kind, excluding it");
                FilterResult::Exclude
            }
        }
    }
}
