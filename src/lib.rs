//! # iofacade
//!
//! One set of path handles over many storage backends.
//!
//! A [`Path`] identifies a location inside one backend. Files, directories and
//! symbolic links are views of a path ([`File`], [`Directory`],
//! [`SymbolicLink`]). Copies and moves work between *any* two backends: when
//! both ends are of the same backend kind the backend's native operation is
//! used, otherwise the entry is transferred generically (directories recreated
//! entry by entry, file contents streamed in fixed-size chunks).
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use iofacade::{FileSystemExt, MemoryFs, SharedFs};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), iofacade::FsError> {
//! let src: SharedFs = Arc::new(MemoryFs::new());
//! let dst: SharedFs = Arc::new(MemoryFs::new());
//!
//! let report = src.get_path("/report.txt")?.as_file()?;
//! report.write_all(b"quarterly numbers")?;
//!
//! let archive = dst.get_path("/archive")?.as_directory()?;
//! archive.create()?;
//!
//! // Copying into an existing directory places the entry inside it.
//! report.copy_to(&archive, false)?;
//! let copied = dst.get_path("/archive/report.txt")?.as_file()?;
//! assert_eq!(copied.read_all()?, b"quarterly numbers");
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Path`] | Backend + location handle; copy, move, delete |
//! | [`File`] / [`Directory`] / [`SymbolicLink`] | Kind-specific views of a path |
//! | [`FileSystemExt`] | `get_path` and `integrate` on a [`SharedFs`] |
//! | [`PathFilter`] / [`FilterResult`] | Three-valued traversal filters |
//! | [`FileSystem`] | What a backend implements |
//! | [`BackendRegistry`] | Backend kinds by id, instantiated from JSON config |
//! | [`FsError`] | Error type with context |
//!
//! ---
//!
//! ## Backends
//!
//! | Backend | Id | Notes |
//! |---------|----|-------|
//! | [`LocalFs`] | `local` | Host filesystem beneath a root directory |
//! | [`MemoryFs`] | `memory` | Everything in a map; for tests and scratch data |
//!
//! New backends implement the component traits of [`FileSystem`]. Destination
//! resolution, overwrite rules, the generic transfer and traversal are shared
//! and apply to every backend unchanged.
//!
//! ---
//!
//! ## Copy and Move
//!
//! ```text
//! source absent?                         → NotFound
//! overwrite = false, dest is a directory → dest/<source name>
//! overwrite = false, target occupied     → AlreadyExists
//! target overlaps source                 → InvalidPath
//! clear target
//! same backend kind?                     → native copy / move
//! otherwise                              → generic transfer (move: then delete source)
//! ```
//!
//! Nothing is atomic across entries. A failed directory copy leaves a
//! partially populated destination; a failed generic move leaves the source
//! intact.
//!
//! ---
//!
//! ## Thread Safety
//!
//! All backend traits require `Send + Sync` and take `&self`. Handles hold an
//! `Arc` to their backend and can be sent between threads freely.
//!
//! ---
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events (dispatch
//! decisions at `debug`, per-entry progress at `trace`). Installing a
//! subscriber is up to the application.

mod config;
mod error;
mod ext;
mod filter;
mod local;
pub mod location;
mod memory;
mod path;
mod registry;
mod traits;
mod transfer;
mod types;
mod walk;

// Public re-exports - error types
pub use error::{ErrorKind, FsError};

// Public re-exports - core types
pub use types::{DirEntry, FileType};

// Public re-exports - backend traits
pub use traits::{FileSystem, FsDir, FsLink, FsNative, FsRead, FsWrite, ReadDirIter, SharedFs};

// Public re-exports - handles
pub use ext::FileSystemExt;
pub use path::{Directory, File, Path, SymbolicLink};

// Public re-exports - traversal
pub use filter::{FilterResult, GlobFilter, IncludeAll, PathFilter};

// Public re-exports - transfer tuning
pub use transfer::CHUNK_SIZE;

// Public re-exports - backends
pub use local::{LocalConfig, LocalFs};
pub use memory::MemoryFs;

// Public re-exports - configuration
pub use config::{ConfigSchema, FieldDescriptor, FieldKind};
pub use registry::{BackendDescriptor, BackendRegistry};
