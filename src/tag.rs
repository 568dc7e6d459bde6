//! Tag forest: arena storage for hierarchical tags.
//!
//! Tags live in a single arena owned by the registry. Parent and child links
//! are stored as [`TagId`] indices, so renames and reparenting are index
//! rewrites plus a path recomputation over the moved subtree.
//!
//! ```text
//! nodes: [ Combat | Combat.Melee | Combat.Ranged | <deleted> | Status ]
//!           ^ root    parent=0       parent=0                   ^ root
//! roots: [0, 4]
//! ```

use serde::{Deserialize, Serialize};

/// Stable identifier of a tag inside one registry.
///
/// Ids are never reused after deletion, and [`reload`](crate::TagRegistry::reload)
/// keeps the id of every path that is still present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(u32);

impl TagId {
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "tag arena overflow");
        Self(index as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw arena index.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// True if `segment` is a valid single tag name (`[A-Za-z0-9]+`).
#[inline]
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TagNode {
    pub(crate) name: String,
    pub(crate) full_path: String,
    pub(crate) parent: Option<TagId>,
    pub(crate) children: Vec<TagId>,
}

/// Arena of tag nodes plus the ordered root list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Forest {
    nodes: Vec<Option<TagNode>>,
    roots: Vec<TagId>,
}

impl Forest {
    /// Empty forest whose next id starts after `reserved` slots.
    ///
    /// Used by reload so that new tags never collide with ids handed out
    /// before the reload.
    pub(crate) fn with_reserved(reserved: usize) -> Self {
        Self {
            nodes: vec![None; reserved],
            roots: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn node(&self, id: TagId) -> Option<&TagNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    fn node_mut(&mut self, id: TagId) -> Option<&mut TagNode> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    #[inline]
    pub(crate) fn contains(&self, id: TagId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn roots(&self) -> &[TagId] {
        &self.roots
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Children of `parent`, or the roots when `parent` is `None`.
    pub(crate) fn siblings(&self, parent: Option<TagId>) -> &[TagId] {
        match parent {
            None => &self.roots,
            Some(p) => self.node(p).map_or(&[], |n| n.children.as_slice()),
        }
    }

    pub(crate) fn find_child(&self, parent: Option<TagId>, name: &str) -> Option<TagId> {
        self.siblings(parent)
            .iter()
            .copied()
            .find(|&c| self.node(c).is_some_and(|n| n.name == name))
    }

    /// Resolve a full path segment by segment.
    pub(crate) fn lookup(&self, path: &str) -> Option<TagId> {
        if path.is_empty() {
            return None;
        }
        let mut current = None;
        for segment in path.split(crate::PATH_SEPARATOR) {
            current = Some(self.find_child(current, segment)?);
        }
        current
    }

    pub(crate) fn full_path_for(&self, parent: Option<TagId>, name: &str) -> String {
        match parent.and_then(|p| self.node(p)) {
            Some(p) => format!("{}.{}", p.full_path, name),
            None => name.to_string(),
        }
    }

    /// Attach a new node. Callers validate the name and sibling uniqueness.
    ///
    /// When `reuse` names a free slot the node takes that id.
    pub(crate) fn insert(&mut self, parent: Option<TagId>, name: &str, reuse: Option<TagId>) -> TagId {
        let node = TagNode {
            name: name.to_string(),
            full_path: self.full_path_for(parent, name),
            parent,
            children: Vec::new(),
        };
        let id = match reuse {
            Some(id) if self.nodes.get(id.index()).is_some_and(Option::is_none) => {
                self.nodes[id.index()] = Some(node);
                id
            }
            _ => {
                let id = TagId::from_index(self.nodes.len());
                self.nodes.push(Some(node));
                id
            }
        };
        self.attach(id, parent);
        id
    }

    /// Strict ancestor test: walks `tag`'s parent chain looking for `ancestor`.
    pub(crate) fn is_child_of(&self, tag: TagId, ancestor: TagId) -> bool {
        let mut current = self.node(tag).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    /// Number of strict ancestors (0 for a root).
    pub(crate) fn depth(&self, tag: TagId) -> usize {
        let mut depth = 0;
        let mut current = self.node(tag).and_then(|n| n.parent);
        while let Some(id) = current {
            depth += 1;
            current = self.node(id).and_then(|n| n.parent);
        }
        depth
    }

    /// Levels below `tag` (0 for a leaf).
    pub(crate) fn height(&self, tag: TagId) -> usize {
        let base = self.depth(tag);
        self.preorder(tag)
            .map(|id| self.depth(id) - base)
            .max()
            .unwrap_or(0)
    }

    fn attach(&mut self, id: TagId, parent: Option<TagId>) {
        match parent {
            None => self.roots.push(id),
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.children.push(id);
                }
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = parent;
        }
    }

    fn detach(&mut self, id: TagId) {
        let parent = self.node(id).and_then(|n| n.parent);
        let list = match parent {
            None => &mut self.roots,
            Some(p) => match self.node_mut(p) {
                Some(node) => &mut node.children,
                None => return,
            },
        };
        list.retain(|&c| c != id);
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Move `id` under `parent` and recompute paths. Callers validate first.
    pub(crate) fn reparent(&mut self, id: TagId, parent: Option<TagId>) {
        self.detach(id);
        self.attach(id, parent);
        self.recompute_paths(id);
    }

    pub(crate) fn set_name(&mut self, id: TagId, name: &str) {
        if let Some(node) = self.node_mut(id) {
            node.name = name.to_string();
        }
        self.recompute_paths(id);
    }

    /// Rebuild `full_path` for `id` and its whole subtree.
    fn recompute_paths(&mut self, id: TagId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let (parent, name) = match self.node(current) {
                Some(n) => (n.parent, n.name.clone()),
                None => continue,
            };
            let path = self.full_path_for(parent, &name);
            if let Some(node) = self.node_mut(current) {
                node.full_path = path;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Detach and free `id` with its subtree. Returns removed ids, leaves first.
    pub(crate) fn remove_subtree(&mut self, id: TagId) -> Vec<TagId> {
        let mut removed: Vec<TagId> = self.preorder(id).collect();
        removed.reverse();
        for &tag in &removed {
            self.detach(tag);
            self.nodes[tag.index()] = None;
        }
        removed
    }

    /// Lazy pre-order walk of `start` and its descendants.
    pub(crate) fn preorder(&self, start: TagId) -> Preorder<'_> {
        let stack = if self.contains(start) { vec![start] } else { Vec::new() };
        Preorder { forest: self, stack }
    }

    /// Lazy pre-order walk over every root's subtree.
    pub(crate) fn preorder_all(&self) -> Preorder<'_> {
        Preorder {
            forest: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }
}

/// Depth-first id iterator. Children are visited in insertion order.
#[derive(Clone, Debug)]
pub(crate) struct Preorder<'a> {
    forest: &'a Forest,
    stack: Vec<TagId>,
}

impl Iterator for Preorder<'_> {
    type Item = TagId;

    fn next(&mut self) -> Option<TagId> {
        let id = self.stack.pop()?;
        if let Some(node) = self.forest.node(id) {
            self.stack.extend(node.children.iter().rev().copied());
        }
        Some(id)
    }
}

/// Borrowed view of a registered tag.
#[derive(Clone, Copy, Debug)]
pub struct TagRef<'a> {
    forest: &'a Forest,
    id: TagId,
    node: &'a TagNode,
}

impl<'a> TagRef<'a> {
    pub(crate) fn new(forest: &'a Forest, id: TagId) -> Option<Self> {
        forest.node(id).map(|node| Self { forest, id, node })
    }

    #[inline]
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Leaf segment, e.g. `Melee` for `Combat.Melee`.
    #[inline]
    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    #[inline]
    pub fn full_path(&self) -> &'a str {
        &self.node.full_path
    }

    pub fn parent(&self) -> Option<TagRef<'a>> {
        self.node.parent.and_then(|p| TagRef::new(self.forest, p))
    }

    pub fn children(&self) -> impl Iterator<Item = TagRef<'a>> + 'a {
        let forest = self.forest;
        self.node
            .children
            .iter()
            .filter_map(move |&c| TagRef::new(forest, c))
    }

    /// Number of strict ancestors.
    pub fn depth(&self) -> usize {
        self.forest.depth(self.id)
    }

    /// True iff `other` is a strict ancestor. A tag is never its own child.
    pub fn is_child_of(&self, other: TagId) -> bool {
        self.forest.is_child_of(self.id, other)
    }

    pub fn is_parent_of(&self, other: TagId) -> bool {
        self.forest.is_child_of(other, self.id)
    }

    /// This tag followed by all descendants, depth-first.
    pub fn iter(&self) -> TagIter<'a> {
        TagIter::subtree(self.forest, self.id)
    }
}

impl PartialEq for TagRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.forest, other.forest) && self.id == other.id
    }
}

impl Eq for TagRef<'_> {}

/// Lazy pre-order sequence of [`TagRef`]s. Each call that produces one starts
/// fresh, so traversals are restartable.
#[derive(Clone, Debug)]
pub struct TagIter<'a> {
    forest: &'a Forest,
    inner: Preorder<'a>,
}

impl<'a> TagIter<'a> {
    pub(crate) fn subtree(forest: &'a Forest, start: TagId) -> Self {
        Self {
            forest,
            inner: forest.preorder(start),
        }
    }

    pub(crate) fn all(forest: &'a Forest) -> Self {
        Self {
            forest,
            inner: forest.preorder_all(),
        }
    }
}

impl<'a> Iterator for TagIter<'a> {
    type Item = TagRef<'a>;

    fn next(&mut self) -> Option<TagRef<'a>> {
        loop {
            let id = self.inner.next()?;
            if let Some(tag) = TagRef::new(self.forest, id) {
                return Some(tag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Combat → Melee → Sword, plus Combat → Ranged.
    fn sample() -> (Forest, [TagId; 4]) {
        let mut forest = Forest::default();
        let combat = forest.insert(None, "Combat", None);
        let melee = forest.insert(Some(combat), "Melee", None);
        let sword = forest.insert(Some(melee), "Sword", None);
        let ranged = forest.insert(Some(combat), "Ranged", None);
        (forest, [combat, melee, sword, ranged])
    }

    #[test]
    fn segment_validation() {
        assert!(is_valid_segment("Combat"));
        assert!(is_valid_segment("Level2"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment("Two Words"));
        assert!(!is_valid_segment("under_score"));
        assert!(!is_valid_segment("dot.ted"));
    }

    #[test]
    fn full_paths_follow_parent_chain() {
        let (forest, [combat, melee, sword, _]) = sample();
        assert_eq!(forest.node(combat).unwrap().full_path, "Combat");
        assert_eq!(forest.node(melee).unwrap().full_path, "Combat.Melee");
        assert_eq!(forest.node(sword).unwrap().full_path, "Combat.Melee.Sword");
    }

    #[test]
    fn is_child_of_is_strict() {
        let (forest, [combat, melee, sword, ranged]) = sample();
        assert!(!forest.is_child_of(combat, combat));
        assert!(forest.is_child_of(melee, combat));
        assert!(forest.is_child_of(sword, combat));
        assert!(!forest.is_child_of(combat, sword));
        assert!(!forest.is_child_of(sword, ranged));
    }

    #[test]
    fn depth_and_height() {
        let (forest, [combat, melee, sword, ranged]) = sample();
        assert_eq!(forest.depth(combat), 0);
        assert_eq!(forest.depth(sword), 2);
        assert_eq!(forest.height(combat), 2);
        assert_eq!(forest.height(melee), 1);
        assert_eq!(forest.height(ranged), 0);
    }

    #[test]
    fn preorder_visits_parent_before_children() {
        let (forest, [combat, melee, sword, ranged]) = sample();
        let order: Vec<_> = forest.preorder(combat).collect();
        assert_eq!(order, vec![combat, melee, sword, ranged]);

        // Restartable: a second walk yields the same sequence.
        let again: Vec<_> = forest.preorder(combat).collect();
        assert_eq!(order, again);
    }

    #[test]
    fn reparent_recomputes_subtree_paths() {
        let (mut forest, [_, melee, sword, ranged]) = sample();
        forest.reparent(melee, Some(ranged));
        assert_eq!(forest.node(sword).unwrap().full_path, "Combat.Ranged.Melee.Sword");
        assert_eq!(forest.siblings(Some(ranged)), &[melee]);

        forest.reparent(melee, None);
        assert_eq!(forest.node(sword).unwrap().full_path, "Melee.Sword");
        assert!(forest.roots().contains(&melee));
    }

    #[test]
    fn remove_subtree_frees_leaves_first() {
        let (mut forest, [combat, melee, sword, ranged]) = sample();
        let removed = forest.remove_subtree(melee);
        assert_eq!(removed, vec![sword, melee]);
        assert!(!forest.contains(melee));
        assert_eq!(forest.siblings(Some(combat)), &[ranged]);

        // Freed ids are not handed out again.
        let fresh = forest.insert(Some(combat), "Melee", None);
        assert_ne!(fresh, melee);
    }

    #[test]
    fn reserved_slots_can_be_reused_explicitly() {
        let mut forest = Forest::with_reserved(3);
        let id = forest.insert(None, "Combat", Some(TagId::from_index(1)));
        assert_eq!(id.raw(), 1);
        let next = forest.insert(None, "Status", None);
        assert_eq!(next.raw(), 3);
    }

    #[test]
    fn tag_ref_views() {
        let (forest, [combat, melee, sword, _]) = sample();
        let tag = TagRef::new(&forest, melee).unwrap();
        assert_eq!(tag.name(), "Melee");
        assert_eq!(tag.parent().unwrap().id(), combat);
        assert_eq!(tag.children().map(|c| c.id()).collect::<Vec<_>>(), vec![sword]);
        assert!(tag.is_child_of(combat));
        assert!(tag.is_parent_of(sword));
        assert_eq!(
            tag.iter().map(|t| t.full_path()).collect::<Vec<_>>(),
            vec!["Combat.Melee", "Combat.Melee.Sword"]
        );
    }
}
