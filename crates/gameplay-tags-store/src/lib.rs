//! File-backed tag definitions for gameplay-tags.
//!
//! This crate provides:
//! - Parsing and validating `tags.toml` files
//! - [`TomlTagStore`], a [`TagStore`](gameplay_tags::TagStore) that mirrors
//!   registry edits into that file
//! - [`registry_from_file`] to open a registry over a file in one call
//!
//! # File format
//!
//! ```toml
//! # Optional, defaults to 4
//! max_depth = 4
//!
//! [tags]
//! paths = ["Combat.Melee", "Combat.Ranged", "Status.Stun"]
//! ```
//!
//! Ancestors do not need to be listed. Opening the registry creates them and
//! writes them back, so after the first open the file lists them explicitly.

mod file_store;
mod tags_file;

pub use file_store::TomlTagStore;
pub use tags_file::{TagEntry, TagsFile, TagsFileError};

use std::path::Path;

use gameplay_tags::TagRegistry;
use tracing::info;

/// Open a registry backed by the tags file at `path`.
///
/// A missing file yields an empty registry; the file is created by the first
/// mutation. Ancestors missing from an existing file are added to it.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or
/// validated.
///
/// # Example
///
/// ```ignore
/// let mut registry = gameplay_tags_store::registry_from_file("tags.toml")?;
/// registry.add_tag("Status.Burning")?; // written to tags.toml
/// ```
pub fn registry_from_file(path: impl AsRef<Path>) -> Result<TagRegistry, TagsFileError> {
    let path = path.as_ref();
    let store = TomlTagStore::new(path);
    let file = store.read()?;
    let store = store.with_max_depth(file.max_depth);
    let registry = TagRegistry::with_store(store, file.registry_config())?;
    info!(path = %path.display(), tags = registry.len(), "opened tag registry");
    Ok(registry)
}

/// Write every tag of `registry` to `path`, replacing the file.
pub fn save_registry(
    registry: &TagRegistry,
    path: impl AsRef<Path>,
) -> Result<(), TagsFileError> {
    let max_depth = Some(registry.config().max_depth);
    let file = TagsFile::from_paths(registry.all_tags().map(|t| t.full_path()), max_depth)?;
    file.write(path)
}
