//! Copying, moving and listing across two backends.
//!
//! Builds a small tree in memory, copies it onto the local filesystem (a
//! generic, streamed transfer), moves part of it back, and lists the result
//! with a glob filter.
//!
//! Run with: `cargo run --example cross_backend`

use iofacade::*;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let scratch = tempfile::tempdir()?;
    let registry = BackendRegistry::with_defaults();

    let mut config = serde_json::Map::new();
    config.insert("root".into(), scratch.path().display().to_string().into());
    let local = registry.create("local", &config)?;
    let memory: SharedFs = Arc::new(MemoryFs::new());

    // =========================================================================
    // Step 1: a tree in memory
    // =========================================================================
    let project = memory.get_path("/project")?.as_directory()?;
    project.create()?;
    memory.get_path("/project/src")?.as_directory()?.create()?;
    memory
        .get_path("/project/README.md")?
        .as_file()?
        .write_all(b"# project\n")?;
    memory
        .get_path("/project/src/main.rs")?
        .as_file()?
        .write_all(b"fn main() {}\n")?;

    // =========================================================================
    // Step 2: copy it to disk, into an existing directory
    // =========================================================================
    let root = local.get_path("/")?;
    project.copy_to(&root, false)?;
    println!("copied {} -> {}", &*project, local.integrate(&root, &project)?);

    // Copying again without overwrite is refused.
    if let Err(e) = project.copy_to(&root, false) {
        println!("second copy refused: {e}");
    }

    // =========================================================================
    // Step 3: move a file back into memory
    // =========================================================================
    let readme = local.get_path("/project/README.md")?;
    let inbox = memory.get_path("/inbox")?.as_directory()?;
    inbox.create()?;
    readme.move_to(&inbox, false)?;
    println!("moved {readme} -> {}", memory.integrate(&inbox, &readme)?);

    // =========================================================================
    // Step 4: list with a filter
    // =========================================================================
    let on_disk = local.get_path("/project")?.as_directory()?;
    for entry in on_disk.list_entries_recursive_with(&GlobFilter::new("*.rs")?)? {
        println!("found {entry}");
    }

    Ok(())
}
