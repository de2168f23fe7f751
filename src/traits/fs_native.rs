//! Backend identity, path syntax, and native fast paths.

use std::any::Any;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::{FsError, location};

/// Backend identity and the operations a backend can perform natively.
///
/// The dispatch layer compares [`id`](Self::id) tags to decide whether a copy
/// or move may use [`native_copy`](Self::native_copy) /
/// [`native_move`](Self::native_move), or must fall back to the generic
/// byte-stream transfer.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsNative`.
pub trait FsNative: Send + Sync {
    /// Stable backend-kind tag (e.g. `"local"`).
    ///
    /// Unique per backend *kind*, shared by every instance of that kind: two
    /// differently configured instances still count as the same backend.
    fn id(&self) -> &str;

    /// Human-readable backend name.
    fn display_name(&self) -> &str;

    /// Parse a raw path string into a location. Must not perform I/O.
    ///
    /// The default accepts `/`-separated strings, see [`location::parse`].
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if the string is not valid for this backend
    fn parse(&self, raw: &str) -> Result<PathBuf, FsError> {
        location::parse(raw)
    }

    /// Location of the entry called `name` inside `directory`. Must not perform I/O.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if `name` is not a single plain segment
    fn join(&self, directory: &Path, name: &OsStr) -> Result<PathBuf, FsError> {
        let multi_segment = name.as_encoded_bytes().contains(&b'/');
        if name.is_empty() || name == "." || name == ".." || multi_segment {
            return Err(FsError::InvalidPath {
                path: directory.join(name),
                reason: format!("{name:?} is not a single path segment"),
            });
        }
        Ok(directory.join(name))
    }

    /// Where `location` lives in storage that other instances may also reach.
    ///
    /// Two instances of one backend kind can share storage (two `LocalFs`
    /// over one host directory). The dispatch layer compares these keys to
    /// refuse copies onto or into the source itself. `None`, the default,
    /// means the instance's storage is private to it. Must not fail.
    fn storage_location(&self, _location: &Path) -> Option<PathBuf> {
        None
    }

    /// Copy `from` to `to` using backend primitives.
    ///
    /// Both handles carry this backend's [`id`](Self::id), but `to` may belong
    /// to a different instance. `to` does not exist when this is called.
    /// Directories are copied recursively.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotSupported`] if either handle is not really of this backend kind
    /// - any I/O failure of the underlying primitives
    fn native_copy(&self, from: &crate::Path, to: &crate::Path) -> Result<(), FsError>;

    /// Move `from` to `to` using backend primitives (e.g. a rename).
    ///
    /// Same preconditions as [`native_copy`](Self::native_copy).
    fn native_move(&self, from: &crate::Path, to: &crate::Path) -> Result<(), FsError>;

    /// Access to the concrete backend, for recovering peer handles' backends.
    fn as_any(&self) -> &dyn Any;
}
