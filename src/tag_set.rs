//! Tag sets: unordered collections of tag references.
//!
//! A [`TagSet`] stores [`TagId`]s only; it never owns tags. Membership tests
//! are plain hash lookups. Ancestor/descendant queries walk parent chains in
//! the [`TagRegistry`], so they take the registry as an argument.
//!
//! ```ignore
//! let held = registry.tag_set_from_paths(["Combat.Melee.Sword"])?;
//! let combat = registry.require_tag("Combat")?;
//!
//! assert!(held.has_descendant_of(&registry, combat));
//! assert!(!held.contains(combat));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::registry::TagRegistry;
use crate::tag::TagId;

/// Whether a tag entered or left a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Removed,
}

/// One effective change to a [`TagSet`].
///
/// Bulk operations return these so callers can forward them to whoever
/// watches the set, instead of the set notifying anyone itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TagChange {
    pub tag: TagId,
    pub kind: ChangeKind,
}

impl TagChange {
    #[inline]
    pub fn added(tag: TagId) -> Self {
        Self {
            tag,
            kind: ChangeKind::Added,
        }
    }

    #[inline]
    pub fn removed(tag: TagId) -> Self {
        Self {
            tag,
            kind: ChangeKind::Removed,
        }
    }
}

/// An unordered set of tag references.
///
/// Iteration order is unspecified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: HashSet<TagId>,
}

impl TagSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn single(tag: TagId) -> Self {
        Self::new().with(tag)
    }

    /// Builder method: add a tag and return self.
    #[inline]
    pub fn with(mut self, tag: TagId) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Returns `true` if the tag was newly inserted.
    #[inline]
    pub fn add(&mut self, tag: TagId) -> bool {
        self.tags.insert(tag)
    }

    /// Returns `true` if the tag was present.
    #[inline]
    pub fn remove(&mut self, tag: TagId) -> bool {
        self.tags.remove(&tag)
    }

    #[inline]
    pub fn contains(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }

    /// True iff some tag of `other` is in `self`. False for an empty `other`.
    pub fn contains_any(&self, other: &TagSet) -> bool {
        other.iter().any(|t| self.contains(t))
    }

    /// True iff every tag of `other` is in `self`. True for an empty `other`.
    pub fn contains_all(&self, other: &TagSet) -> bool {
        other.iter().all(|t| self.contains(t))
    }

    /// New set with the members of `self` that are not in `other`.
    pub fn difference(&self, other: &TagSet) -> TagSet {
        self.tags.difference(&other.tags).copied().collect()
    }

    /// Add every tag of `other`, reporting the ones that were new.
    pub fn add_all(&mut self, other: &TagSet) -> Vec<TagChange> {
        other
            .iter()
            .filter(|&t| self.add(t))
            .map(TagChange::added)
            .collect()
    }

    /// Remove every tag of `other`, reporting the ones that were present.
    pub fn remove_all(&mut self, other: &TagSet) -> Vec<TagChange> {
        other
            .iter()
            .filter(|&t| self.remove(t))
            .map(TagChange::removed)
            .collect()
    }

    /// Drop members the registry no longer knows (e.g. after `delete_tag`).
    pub fn retain_registered(&mut self, registry: &TagRegistry) -> Vec<TagChange> {
        let stale: Vec<TagId> = self
            .iter()
            .filter(|&t| !registry.contains_id(t))
            .collect();
        stale
            .into_iter()
            .filter(|&t| self.remove(t))
            .map(TagChange::removed)
            .collect()
    }

    // =========================================================================
    // Hierarchy queries
    // =========================================================================

    /// True iff some member is a strict ancestor of `tag`.
    pub fn has_ancestor_of(&self, registry: &TagRegistry, tag: TagId) -> bool {
        self.iter().any(|m| registry.is_child_of(tag, m))
    }

    /// True iff every member is a strict ancestor of `tag`.
    pub fn all_are_ancestors_of(&self, registry: &TagRegistry, tag: TagId) -> bool {
        self.iter().all(|m| registry.is_child_of(tag, m))
    }

    /// True iff some member is a strict descendant of `tag`.
    pub fn has_descendant_of(&self, registry: &TagRegistry, tag: TagId) -> bool {
        self.iter().any(|m| registry.is_child_of(m, tag))
    }

    /// True iff every member is a strict descendant of `tag`.
    pub fn all_are_descendants_of(&self, registry: &TagRegistry, tag: TagId) -> bool {
        self.iter().all(|m| registry.is_child_of(m, tag))
    }

    /// True iff `self` holds an ancestor of at least one tag in `other`.
    pub fn has_ancestor_of_any(&self, registry: &TagRegistry, other: &TagSet) -> bool {
        other.iter().any(|t| self.has_ancestor_of(registry, t))
    }

    /// True iff `self` holds an ancestor of every tag in `other`.
    pub fn has_ancestor_of_all(&self, registry: &TagRegistry, other: &TagSet) -> bool {
        other.iter().all(|t| self.has_ancestor_of(registry, t))
    }

    pub fn has_descendant_of_any(&self, registry: &TagRegistry, other: &TagSet) -> bool {
        other.iter().any(|t| self.has_descendant_of(registry, t))
    }

    pub fn has_descendant_of_all(&self, registry: &TagRegistry, other: &TagSet) -> bool {
        other.iter().all(|t| self.has_descendant_of(registry, t))
    }

    // =========================================================================
    // Collection plumbing
    // =========================================================================

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = TagId> + '_ {
        self.tags.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.tags.clear();
    }
}

impl FromIterator<TagId> for TagSet {
    fn from_iter<T: IntoIterator<Item = TagId>>(iter: T) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl Extend<TagId> for TagSet {
    fn extend<T: IntoIterator<Item = TagId>>(&mut self, iter: T) {
        self.tags.extend(iter);
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = TagId;
    type IntoIter = std::iter::Copied<std::collections::hash_set::Iter<'a, TagId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter().copied()
    }
}

// =============================================================================
// Tests
// =============================================================================
