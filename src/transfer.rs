//! Copy/move dispatch shared by every backend.
//!
//! Every copy or move goes through the same steps:
//!
//! 1. the source must exist;
//! 2. the effective destination is resolved (integrating into an existing
//!    directory unless `overwrite` is set) and checked for occupancy;
//! 3. a destination overlapping the source is refused, also across
//!    instances sharing storage;
//! 4. the effective destination is cleared;
//! 5. same backend kind → the backend's native operation, otherwise the
//!    generic transfer: directories recreated entry by entry, files streamed
//!    through a fixed-size buffer, symbolic links handed to the source
//!    backend's native copy.
//!
//! Nothing is retried or rolled back. The first failure aborts the remaining
//! work and leaves whatever was already written in place; a generic move
//! deletes its source only after the copy has fully succeeded.

use std::io::{self, Read, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{FileType, FsError, Path, location};

/// Size of the buffer files are streamed through during a generic transfer.
pub const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Copy,
    Move,
}

impl Mode {
    fn operation(self) -> &'static str {
        match self {
            Mode::Copy => "copy",
            Mode::Move => "move",
        }
    }
}

pub(crate) fn copy(source: &Path, dest: &Path, overwrite: bool) -> Result<(), FsError> {
    transfer(source, dest, overwrite, Mode::Copy)
}

pub(crate) fn move_path(source: &Path, dest: &Path, overwrite: bool) -> Result<(), FsError> {
    transfer(source, dest, overwrite, Mode::Move)
}

/// Location for `path`'s last segment inside `directory`, in `directory`'s backend.
///
/// Pure: nothing is checked on storage.
pub(crate) fn integrate(directory: &Path, path: &Path) -> Result<Path, FsError> {
    let name = path.location().file_name().ok_or_else(|| FsError::InvalidPath {
        path: path.location().to_path_buf(),
        reason: "a backend root has no name to integrate".into(),
    })?;
    let fs = directory.file_system();
    let joined = fs.join(directory.location(), name)?;
    Ok(Path::new(Arc::clone(fs), joined))
}

fn transfer(source: &Path, dest: &Path, overwrite: bool, mode: Mode) -> Result<(), FsError> {
    let operation = mode.operation();

    if !source.exists()? {
        return Err(FsError::NotFound {
            path: source.location().to_path_buf(),
        });
    }

    let target = effective_destination(source, dest, overwrite, operation)?;
    reject_overlap(source, &target)?;

    target.delete_if_exists()?;

    if source.is_same_backend(&target) {
        debug!(%source, destination = %target, "native {operation}");
        let fs = source.file_system();
        return match mode {
            Mode::Copy => fs.native_copy(source, &target),
            Mode::Move => fs.native_move(source, &target),
        };
    }

    debug!(%source, destination = %target, "generic {operation}");
    generic_copy(source, &target)?;
    if mode == Mode::Move {
        source.delete()?;
    }
    Ok(())
}

/// Apply the overwrite policy to `dest`.
fn effective_destination(
    source: &Path,
    dest: &Path,
    overwrite: bool,
    operation: &'static str,
) -> Result<Path, FsError> {
    if overwrite {
        return Ok(dest.clone());
    }

    let target = if dest.is_directory()? {
        integrate(dest, source)?
    } else {
        dest.clone()
    };

    if target.exists()? {
        return Err(FsError::AlreadyExists {
            path: target.location().to_path_buf(),
            operation,
        });
    }
    Ok(target)
}

/// Refuse to copy an entry onto itself, onto an ancestor (clearing it would
/// delete the source), or into its own subtree.
///
/// Handles of one instance are compared by location. Handles of two
/// instances of one backend kind are compared by
/// [`storage_location`](crate::FsNative::storage_location) when both
/// backends report one.
fn reject_overlap(source: &Path, target: &Path) -> Result<(), FsError> {
    let (src, dst) = if source.is_same_instance(target) {
        (source.location().to_path_buf(), target.location().to_path_buf())
    } else if source.is_same_backend(target) {
        let src = source.file_system().storage_location(source.location());
        let dst = target.file_system().storage_location(target.location());
        match (src, dst) {
            (Some(src), Some(dst)) => (src, dst),
            _ => return Ok(()),
        }
    } else {
        return Ok(());
    };
    let reason = if src == dst {
        "source and destination are the same"
    } else if location::is_within(&src, &dst) {
        "destination contains the source"
    } else if location::is_within(&dst, &src) {
        "destination lies inside the source"
    } else {
        return Ok(());
    };
    Err(FsError::InvalidPath {
        path: target.location().to_path_buf(),
        reason: reason.into(),
    })
}

/// Backend-agnostic copy of `source` to the (absent) `target`.
fn generic_copy(source: &Path, target: &Path) -> Result<(), FsError> {
    match source.file_type()? {
        None => Err(FsError::NotFound {
            path: source.location().to_path_buf(),
        }),
        Some(FileType::Directory) => {
            target.file_system().create_dir(target.location())?;
            let children = source
                .file_system()
                .read_dir(source.location())?
                .collect_all()?;
            for child in children {
                let child = Path::new(Arc::clone(source.file_system()), child.path);
                trace!(entry = %child, destination = %target, "transferring entry");
                copy(&child, target, false)?;
            }
            Ok(())
        }
        Some(FileType::File) => {
            target.file_system().create_file(target.location())?;
            stream_copy(source, target)
        }
        // Links have no portable representation; let the source backend try.
        Some(FileType::Symlink) => source.file_system().native_copy(source, target),
    }
}

/// Stream the bytes of `source` into `target` through a [`CHUNK_SIZE`] buffer.
///
/// Both streams live only inside this function and are dropped (closed) on
/// every return path.
fn stream_copy(source: &Path, target: &Path) -> Result<(), FsError> {
    let mut reader = source.file_system().open_read(source.location())?;
    let mut writer = target.file_system().open_write(target.location())?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FsError::io("read", source.location(), e)),
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|e| FsError::io("write", target.location(), e))?;
        total += read as u64;
    }
    writer
        .flush()
        .map_err(|e| FsError::io("flush", target.location(), e))?;

    trace!(bytes = total, %source, destination = %target, "streamed file");
    Ok(())
}
