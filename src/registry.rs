//! Tag registry: canonical creation, lookup, rename, reparent, and deletion.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::TagError;
use crate::store::{MemoryTagStore, TagStore};
use crate::tag::{is_valid_segment, Forest, TagId, TagIter, TagRef};
use crate::tag_set::TagSet;

const ROOT_LABEL: &str = "<root>";

/// Owner of the tag forest.
///
/// Provides:
/// - Path → tag lookup, descending segment by segment
/// - Idempotent creation of whole paths (missing ancestors are created)
/// - Rename and reparent with full-path cascades over the subtree
/// - Recursive deletion
/// - Pre-order iteration over every tag
///
/// Every structural call validates first, mirrors the change to the attached
/// [`TagStore`], then mutates the forest. A failing call leaves the registry
/// unchanged.
pub struct TagRegistry {
    config: RegistryConfig,
    forest: Forest,
    store: Box<dyn TagStore>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl TagRegistry {
    /// Empty registry backed by a [`MemoryTagStore`].
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            forest: Forest::default(),
            store: Box::new(MemoryTagStore::new()),
        }
    }

    /// Attach a store and build the forest from its contents.
    pub fn with_store(store: impl TagStore + 'static, config: RegistryConfig) -> Result<Self, TagError> {
        let mut registry = Self {
            config,
            forest: Forest::default(),
            store: Box::new(store),
        };
        registry.reload()?;
        Ok(registry)
    }

    #[inline]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn TagStore {
        self.store.as_ref()
    }

    /// Mutable access to the backing store, for bulk external edits that are
    /// followed by [`reload`](Self::reload).
    pub fn store_mut(&mut self) -> &mut dyn TagStore {
        self.store.as_mut()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Exact-path lookup. `None` if any segment is missing.
    pub fn get_tag(&self, path: &str) -> Option<TagRef<'_>> {
        self.forest.lookup(path).and_then(|id| TagRef::new(&self.forest, id))
    }

    /// Like [`get_tag`](Self::get_tag) but reports a miss as [`TagError::TagNotFound`].
    pub fn require_tag(&self, path: &str) -> Result<TagId, TagError> {
        self.forest
            .lookup(path)
            .ok_or_else(|| TagError::TagNotFound(path.to_string()))
    }

    pub fn tag(&self, id: TagId) -> Option<TagRef<'_>> {
        TagRef::new(&self.forest, id)
    }

    pub fn path_of(&self, id: TagId) -> Option<&str> {
        self.forest.node(id).map(|n| n.full_path.as_str())
    }

    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.forest.lookup(path).is_some()
    }

    #[inline]
    pub fn contains_id(&self, id: TagId) -> bool {
        self.forest.contains(id)
    }

    /// Total number of registered tags.
    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.roots().is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = TagRef<'_>> + '_ {
        self.forest
            .roots()
            .iter()
            .filter_map(|&id| TagRef::new(&self.forest, id))
    }

    /// Every tag, root by root, each subtree in pre-order.
    pub fn all_tags(&self) -> TagIter<'_> {
        TagIter::all(&self.forest)
    }

    /// `tag` followed by its descendants in pre-order. Empty if `tag` is unknown.
    pub fn descendants(&self, tag: TagId) -> TagIter<'_> {
        TagIter::subtree(&self.forest, tag)
    }

    /// True iff `ancestor` is a strict ancestor of `tag`.
    #[inline]
    pub fn is_child_of(&self, tag: TagId, ancestor: TagId) -> bool {
        self.forest.is_child_of(tag, ancestor)
    }

    #[inline]
    pub fn is_parent_of(&self, tag: TagId, descendant: TagId) -> bool {
        self.forest.is_child_of(descendant, tag)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Create `path` and any missing ancestors, returning the leaf.
    ///
    /// Idempotent: an existing path returns its existing id and touches nothing.
    ///
    /// # Errors
    ///
    /// - [`TagError::InvalidTagName`] for an empty or non-alphanumeric segment
    /// - [`TagError::DepthExceeded`] if the path has more than `max_depth` segments
    /// - [`TagError::Store`] if the store rejects a new tag
    pub fn add_tag(&mut self, path: &str) -> Result<TagId, TagError> {
        let segments = split_path(path)?;
        if segments.len() > self.config.max_depth {
            warn!(path, max = self.config.max_depth, "rejected tag: too deep");
            return Err(TagError::DepthExceeded {
                path: path.to_string(),
                depth: segments.len(),
                max: self.config.max_depth,
            });
        }

        // Longest existing prefix.
        let mut parent = None;
        let mut existing = 0;
        for segment in &segments {
            match self.forest.find_child(parent, segment) {
                Some(id) => {
                    parent = Some(id);
                    existing += 1;
                }
                None => break,
            }
        }
        if existing == segments.len()
            && let Some(id) = parent
        {
            return Ok(id);
        }

        let missing: Vec<String> = (existing..segments.len())
            .map(|i| segments[..=i].join("."))
            .collect();
        self.persist_all(&missing)?;

        for segment in &segments[existing..] {
            let id = self.forest.insert(parent, segment, None);
            debug!(path = %self.forest.full_path_for(parent, segment), id = id.raw(), "created tag");
            parent = Some(id);
        }
        // `segments` is never empty, so at least one node was created above.
        parent.ok_or_else(|| TagError::InvalidTagName {
            name: path.to_string(),
        })
    }

    /// Rename the leaf segment of `tag`; the subtree's full paths follow.
    ///
    /// Renaming to the current name is a no-op.
    ///
    /// # Errors
    ///
    /// - [`TagError::TagNotFound`] if `tag` is not registered
    /// - [`TagError::InvalidTagName`] for empty, whitespace, or non-alphanumeric names
    /// - [`TagError::DuplicateSibling`] if a sibling already uses `new_name`
    pub fn rename_tag(&mut self, tag: TagId, new_name: &str) -> Result<(), TagError> {
        let node = self.forest.node(tag).ok_or_else(|| not_found(tag))?;
        if !is_valid_segment(new_name) {
            warn!(name = new_name, "rejected rename: invalid name");
            return Err(TagError::InvalidTagName {
                name: new_name.to_string(),
            });
        }
        if node.name == new_name {
            return Ok(());
        }
        let parent = node.parent;
        if self.forest.find_child(parent, new_name).is_some() {
            warn!(name = new_name, "rejected rename: sibling exists");
            return Err(TagError::DuplicateSibling {
                name: new_name.to_string(),
                parent: self.label(parent),
            });
        }

        let new_prefix = self.forest.full_path_for(parent, new_name);
        let moves = self.subtree_moves(tag, &new_prefix);
        self.rename_all(&moves)?;

        let old = node_path(&moves);
        self.forest.set_name(tag, new_name);
        debug!(from = %old, to = %new_prefix, "renamed tag");
        Ok(())
    }

    /// Move `tag` (with its subtree) under `new_parent`, or to the roots for `None`.
    ///
    /// # Errors
    ///
    /// - [`TagError::TagNotFound`] if either tag is not registered
    /// - [`TagError::CycleRejected`] if `new_parent` is `tag` or one of its descendants
    /// - [`TagError::DuplicateSibling`] if the new parent already has a child with this name
    /// - [`TagError::DepthExceeded`] if the deepest moved tag would exceed `max_depth`
    pub fn set_parent(&mut self, tag: TagId, new_parent: Option<TagId>) -> Result<(), TagError> {
        let node = self.forest.node(tag).ok_or_else(|| not_found(tag))?;
        if let Some(p) = new_parent {
            if !self.forest.contains(p) {
                return Err(not_found(p));
            }
            if p == tag || self.forest.is_child_of(p, tag) {
                warn!(tag = %node.full_path, "rejected reparent: cycle");
                return Err(TagError::CycleRejected {
                    tag: node.full_path.clone(),
                    parent: self.label(Some(p)),
                });
            }
        }
        if node.parent == new_parent {
            return Ok(());
        }
        if self.forest.find_child(new_parent, &node.name).is_some() {
            return Err(TagError::DuplicateSibling {
                name: node.name.clone(),
                parent: self.label(new_parent),
            });
        }

        let new_prefix = self.forest.full_path_for(new_parent, &node.name);
        let base_depth = new_parent.map_or(0, |p| self.forest.depth(p) + 1);
        let levels = base_depth + self.forest.height(tag) + 1;
        if levels > self.config.max_depth {
            warn!(path = %new_prefix, levels, "rejected reparent: too deep");
            return Err(TagError::DepthExceeded {
                path: new_prefix,
                depth: levels,
                max: self.config.max_depth,
            });
        }

        let moves = self.subtree_moves(tag, &new_prefix);
        self.rename_all(&moves)?;
        self.forest.reparent(tag, new_parent);
        debug!(from = %node_path(&moves), to = %new_prefix, "reparented tag");
        Ok(())
    }

    /// Delete `tag` and its whole subtree, leaves first.
    ///
    /// Returns the removed ids so holders of [`TagSet`]s can purge them.
    pub fn delete_tag(&mut self, tag: TagId) -> Result<Vec<TagId>, TagError> {
        if !self.forest.contains(tag) {
            return Err(not_found(tag));
        }
        let mut doomed: Vec<(TagId, String)> = self
            .forest
            .preorder(tag)
            .filter_map(|id| self.forest.node(id).map(|n| (id, n.full_path.clone())))
            .collect();
        doomed.reverse();

        for (i, (_, path)) in doomed.iter().enumerate() {
            if let Err(err) = self.store.delete(path) {
                warn!(path = %path, %err, "store delete failed, restoring");
                for (_, restored) in doomed[..i].iter().rev() {
                    if let Err(err) = self.store.persist(restored) {
                        warn!(path = %restored, %err, "rollback persist failed, store diverged");
                    }
                }
                return Err(err.into());
            }
        }

        let removed = self.forest.remove_subtree(tag);
        if let Some((_, path)) = doomed.last() {
            debug!(path = %path, count = removed.len(), "deleted tag subtree");
        }
        Ok(removed)
    }

    /// Rebuild the forest from the store.
    ///
    /// Tags whose path survives keep their id. Every stored path is validated
    /// before the new forest replaces the old one. Ancestors the store leaves
    /// implicit are persisted, so later renames and deletes find them.
    pub fn reload(&mut self) -> Result<(), TagError> {
        let paths = self.store.load()?;
        let stored: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let mut forest = Forest::with_reserved(self.forest.slot_count());
        let mut implicit = Vec::new();

        for path in &paths {
            let segments = split_path(path)?;
            if segments.len() > self.config.max_depth {
                warn!(path = %path, "stored tag exceeds max depth");
                return Err(TagError::DepthExceeded {
                    path: path.clone(),
                    depth: segments.len(),
                    max: self.config.max_depth,
                });
            }
            let mut parent = None;
            for (i, segment) in segments.iter().enumerate() {
                parent = Some(match forest.find_child(parent, segment) {
                    Some(id) => id,
                    None => {
                        let full_path = segments[..=i].join(".");
                        let reuse = self.forest.lookup(&full_path);
                        if !stored.contains(full_path.as_str()) {
                            implicit.push(full_path);
                        }
                        forest.insert(parent, segment, reuse)
                    }
                });
            }
        }

        if !implicit.is_empty() {
            debug!(count = implicit.len(), "persisting implicit ancestors");
            self.persist_all(&implicit)?;
        }
        self.forest = forest;
        info!(tags = self.forest.len(), "reloaded tag registry");
        Ok(())
    }

    // =========================================================================
    // Tag set helpers
    // =========================================================================

    /// Resolve paths into a [`TagSet`]. Fails on the first unknown path.
    pub fn tag_set_from_paths<'p>(
        &self,
        paths: impl IntoIterator<Item = &'p str>,
    ) -> Result<TagSet, TagError> {
        paths.into_iter().map(|p| self.require_tag(p)).collect()
    }

    /// Sorted full paths of the set's members. Stale ids are skipped.
    pub fn paths_of(&self, set: &TagSet) -> Vec<&str> {
        let mut paths: Vec<&str> = set.iter().filter_map(|id| self.path_of(id)).collect();
        paths.sort_unstable();
        paths
    }

    /// Human-readable `[A, A.B]` rendering of a set.
    pub fn display_set(&self, set: &TagSet) -> String {
        format!("[{}]", self.paths_of(set).join(", "))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn label(&self, parent: Option<TagId>) -> String {
        parent
            .and_then(|p| self.path_of(p))
            .unwrap_or(ROOT_LABEL)
            .to_string()
    }

    /// (old, new) full paths for `tag`'s subtree once `tag` is at `new_prefix`.
    fn subtree_moves(&self, tag: TagId, new_prefix: &str) -> Vec<(String, String)> {
        let old_prefix = self.path_of(tag).unwrap_or_default();
        self.forest
            .preorder(tag)
            .filter_map(|id| self.path_of(id))
            .map(|old| {
                let suffix = &old[old_prefix.len()..];
                (old.to_string(), format!("{new_prefix}{suffix}"))
            })
            .collect()
    }

    fn persist_all(&mut self, paths: &[String]) -> Result<(), TagError> {
        for (i, path) in paths.iter().enumerate() {
            if let Err(err) = self.store.persist(path) {
                warn!(path = %path, %err, "store persist failed, rolling back");
                for done in paths[..i].iter().rev() {
                    if let Err(err) = self.store.delete(done) {
                        warn!(path = %done, %err, "rollback delete failed, store diverged");
                    }
                }
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn rename_all(&mut self, moves: &[(String, String)]) -> Result<(), TagError> {
        for (i, (old, new)) in moves.iter().enumerate() {
            if let Err(err) = self.store.rename(old, new) {
                warn!(from = %old, to = %new, %err, "store rename failed, rolling back");
                for (done_old, done_new) in moves[..i].iter().rev() {
                    if let Err(err) = self.store.rename(done_new, done_old) {
                        warn!(from = %done_new, to = %done_old, %err, "rollback rename failed, store diverged");
                    }
                }
                return Err(err.into());
            }
        }
        Ok(())
    }
}

/// Split "A.B.C" into validated segments.
fn split_path(path: &str) -> Result<Vec<&str>, TagError> {
    let segments: Vec<&str> = path.split(crate::PATH_SEPARATOR).collect();
    for segment in &segments {
        if !is_valid_segment(segment) {
            let name = if segment.is_empty() { path } else { segment };
            return Err(TagError::InvalidTagName {
                name: name.to_string(),
            });
        }
    }
    Ok(segments)
}

fn not_found(id: TagId) -> TagError {
    TagError::TagNotFound(format!("#{}", id.raw()))
}

fn node_path(moves: &[(String, String)]) -> &str {
    moves.first().map_or("", |(old, _)| old.as_str())
}

// =============================================================================
// Tests
// =============================================================================
