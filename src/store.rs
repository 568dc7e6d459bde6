//! Backing store boundary for tag definitions.
//!
//! The registry is the in-memory source of truth, but every structural
//! mutation is mirrored to a [`TagStore`] so the forest can be rebuilt with
//! [`TagRegistry::reload`](crate::TagRegistry::reload). Stores only deal in
//! full dot-paths; they never see the arena.

use std::collections::BTreeSet;

use thiserror::Error;

/// Failure reported by a [`TagStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tag store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("tag store is malformed: {0}")]
    Malformed(String),
}

/// Durable collection of tag definitions.
///
/// `persist` is called once for every tag the registry creates (ancestors
/// included), `delete` once per removed tag (leaves first), and `rename` once
/// per tag whose full path changed.
pub trait TagStore: Send + Sync {
    /// All stored tag paths, in any order.
    fn load(&self) -> Result<Vec<String>, StoreError>;

    fn persist(&mut self, path: &str) -> Result<(), StoreError>;

    fn delete(&mut self, path: &str) -> Result<(), StoreError>;

    fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), StoreError>;
}

/// Store that keeps paths in memory. Used when no durable store is attached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryTagStore {
    paths: BTreeSet<String>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing paths (e.g. from an asset bundle).
    pub fn with_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl TagStore for MemoryTagStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.paths.iter().cloned().collect())
    }

    fn persist(&mut self, path: &str) -> Result<(), StoreError> {
        self.paths.insert(path.to_string());
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        self.paths.remove(path);
        Ok(())
    }

    fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), StoreError> {
        if !self.paths.remove(old_path) {
            return Err(StoreError::Malformed(format!(
                "cannot rename '{old_path}': not stored"
            )));
        }
        self.paths.insert(new_path.to_string());
        Ok(())
    }
}
