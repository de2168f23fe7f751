//! # Backend Traits
//!
//! The capability set a storage backend implements.
//!
//! ## Components
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`FsRead`] | `file_type`, `open_read` |
//! | [`FsWrite`] | `create_file`, `open_write`, `remove` |
//! | [`FsDir`] | `read_dir`, `create_dir` |
//! | [`FsLink`] | `symlink`, `read_link` |
//! | [`FsNative`] | `id`, `parse`, `join`, `storage_location`, `native_copy`, `native_move` |
//!
//! ```text
//! FsRead + FsWrite + FsDir + FsLink + FsNative = FileSystem
//! ```
//!
//! [`FileSystem`] has a blanket implementation: implement the five
//! components and a backend gets it for free. Backends never implement
//! copy/move dispatch, overwrite policy, or traversal themselves; those live
//! once in the [`Path`](crate::Path) handle and apply to every backend.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Backends use interior
//! mutability for their own state.
//!
//! ## Object Safety
//!
//! All traits are object-safe; handles hold backends as [`SharedFs`]:
//!
//! ```rust
//! use iofacade::{FileSystem, FsError};
//! use std::path::Path;
//!
//! fn is_there(fs: &dyn FileSystem) -> Result<bool, FsError> {
//!     Ok(fs.file_type(Path::new("/file.txt"))?.is_some())
//! }
//! ```

use std::sync::Arc;

mod fs_dir;
mod fs_link;
mod fs_native;
mod fs_read;
mod fs_write;

pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_link::FsLink;
pub use fs_native::FsNative;
pub use fs_read::FsRead;
pub use fs_write::FsWrite;

/// A complete storage backend.
///
/// Combines reading ([`FsRead`]), writing ([`FsWrite`]), directories
/// ([`FsDir`]), symbolic links ([`FsLink`]) and identity/native operations
/// ([`FsNative`]).
///
/// # Blanket Implementation
///
/// Automatically implemented for any type that implements all five component
/// traits. You never need to implement `FileSystem` directly.
pub trait FileSystem: FsRead + FsWrite + FsDir + FsLink + FsNative {}

// Blanket implementation - any type implementing all five gets FileSystem for free
impl<T: FsRead + FsWrite + FsDir + FsLink + FsNative> FileSystem for T {}

/// Shared, type-erased backend: the back-reference every [`Path`](crate::Path) carries.
pub type SharedFs = Arc<dyn FileSystem>;
