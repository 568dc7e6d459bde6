//! [`TagStore`] backed by a `tags.toml` file.

use std::path::{Path, PathBuf};

use gameplay_tags::{StoreError, TagStore};
use tracing::{debug, trace};

use crate::tags_file::{TagsFile, TagsFileError};

impl From<TagsFileError> for StoreError {
    fn from(err: TagsFileError) -> Self {
        match err {
            TagsFileError::Io { source, .. } => StoreError::Io(source),
            other => StoreError::Malformed(other.to_string()),
        }
    }
}

/// Store that rewrites a `tags.toml` file on every mutation.
///
/// The file is re-read before each change so edits made outside the
/// registry between calls are kept. A missing file reads as empty and is
/// created on the first write.
///
/// Ancestors the file leaves implicit are written back by
/// [`TagRegistry::reload`](gameplay_tags::TagRegistry::reload), so every
/// path `rename` and `delete` see is listed.
#[derive(Debug, Clone)]
pub struct TomlTagStore {
    path: PathBuf,
    max_depth: Option<usize>,
}

impl TomlTagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_depth: None,
        }
    }

    /// Depth limit written to a newly created file.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents, or an empty file if it does not exist yet.
    pub fn read(&self) -> Result<TagsFile, TagsFileError> {
        if !self.path.exists() {
            return Ok(TagsFile::new(self.max_depth));
        }
        TagsFile::from_file(&self.path)
    }

    fn modify(
        &self,
        apply: impl FnOnce(&mut TagsFile) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut file = self.read()?;
        apply(&mut file)?;
        file.write(&self.path)?;
        trace!(path = %self.path.display(), tags = file.len(), "wrote tags file");
        Ok(())
    }
}

impl TagStore for TomlTagStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        let file = self.read()?;
        debug!(path = %self.path.display(), tags = file.len(), "loaded tags file");
        Ok(file.paths().map(str::to_owned).collect())
    }

    fn persist(&mut self, path: &str) -> Result<(), StoreError> {
        self.modify(|file| {
            file.paths_mut().insert(path.to_owned());
            Ok(())
        })
    }

    fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        self.modify(|file| {
            file.paths_mut().remove(path);
            Ok(())
        })
    }

    fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), StoreError> {
        self.modify(|file| {
            let paths = file.paths_mut();
            if !paths.remove(old_path) {
                return Err(StoreError::Malformed(format!(
                    "cannot rename '{old_path}': not in tags file"
                )));
            }
            paths.insert(new_path.to_owned());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, TomlTagStore) {
        let dir = TempDir::new().unwrap();
        let store = TomlTagStore::new(dir.path().join("tags.toml"));
        (dir, store)
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn mutations_reach_the_file() {
        let (_dir, mut store) = store();
        store.persist("Combat").unwrap();
        store.persist("Combat.Melee").unwrap();
        store.rename("Combat.Melee", "Combat.Slash").unwrap();
        store.delete("Combat").unwrap();

        let file = TagsFile::from_file(store.path()).unwrap();
        assert_eq!(file.paths().collect::<Vec<_>>(), vec!["Combat.Slash"]);
    }

    #[test]
    fn rename_of_unknown_path_fails() {
        let (_dir, mut store) = store();
        let err = store.rename("Nope", "Other").unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn rename_of_unlisted_ancestor_fails() {
        let (_dir, mut store) = store();
        std::fs::write(store.path(), "[tags]\npaths = [\"Combat.Melee\"]\n").unwrap();

        let err = store.rename("Combat", "Fight").unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
        assert_eq!(store.read().unwrap().paths().collect::<Vec<_>>(), vec!["Combat.Melee"]);
    }

    #[test]
    fn invalid_file_surfaces_as_malformed() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "[tags]\npaths = [\"Bad Name\"]\n").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn new_file_records_max_depth() {
        let (_dir, store) = store();
        let mut store = store.with_max_depth(Some(6));
        store.persist("A").unwrap();
        assert_eq!(store.read().unwrap().max_depth, Some(6));
    }
}
