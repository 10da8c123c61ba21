use crate::error::TreeError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a node inside the arena. Stable for the lifetime of an epoch.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A tagged node reference: arena index plus the arena epoch it was taken in.
///
/// References taken before a [`TreeArena::clear`] fail every fallible query
/// with [`TreeError::InvalidReference`] afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub(crate) id: NodeId,
    pub(crate) epoch: u64,
}

impl NodeRef {
    /// Returns the underlying arena index.
    #[must_use]
    pub const fn id(self) -> NodeId {
        self.id
    }
}

pub(crate) struct NodeSlot {
    ident: String,
    parent: Option<NodeId>,
    // `None` means leaf forever; `Some(empty)` means expandable with zero rows.
    children: Option<Vec<NodeId>>,
}

impl NodeSlot {
    pub(crate) fn ident(&self) -> &str {
        &self.ident
    }

    pub(crate) const fn is_expandable(&self) -> bool {
        self.children.is_some()
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Parent-indexed node arena holding one tree per section.
///
/// Nodes live in a flat table; children are index lists, so there is no
/// ownership cycle and no node can appear in two places. Sections are
/// independent root lists (most hosts use a single section).
pub struct TreeArena {
    nodes: Vec<NodeSlot>,
    sections: Vec<Vec<NodeId>>,
    epoch: u64,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    /// Creates an arena with a single section.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sections(1)
    }

    /// Creates an arena with `sections` independent root lists (at least one).
    #[must_use]
    pub fn with_sections(sections: usize) -> Self {
        Self {
            nodes: Vec::new(),
            sections: vec![Vec::new(); sections.max(1)],
            epoch: 0,
        }
    }

    /// Current arena epoch. Bumped by [`Self::clear`].
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of independent trees held by the arena.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total number of nodes across all sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Discards every node and invalidates all outstanding references.
    ///
    /// The section count is preserved; the epoch is bumped so that stale
    /// `NodeRef`s and pending drops can be detected.
    pub fn clear(&mut self) {
        self.nodes.clear();
        for roots in &mut self.sections {
            roots.clear();
        }
        self.epoch += 1;
    }

    /// Appends a leaf node at the end of a section's root list.
    ///
    /// # Errors
    /// `IndexOutOfRange` if the section does not exist.
    pub fn add_root(&mut self, section: usize, ident: impl Into<String>) -> Result<NodeRef, TreeError> {
        let at = self.section_roots_checked(section)?.len();
        self.insert_root(section, at, ident)
    }

    /// Inserts a leaf node into a section's root list at `at`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if the section does not exist or `at` is past the end.
    pub fn insert_root(
        &mut self,
        section: usize,
        at: usize,
        ident: impl Into<String>,
    ) -> Result<NodeRef, TreeError> {
        let len = self.section_roots_checked(section)?.len();
        if at > len {
            return Err(TreeError::IndexOutOfRange { index: at, len });
        }
        let id = self.push_slot(ident.into(), None);
        self.sections[section].insert(at, id);
        Ok(self.make_ref(id))
    }

    /// Appends a leaf node under `parent`, making the parent expandable if it
    /// was not already.
    ///
    /// # Errors
    /// `InvalidReference` if `parent` is not part of the current tree.
    pub fn add_child(&mut self, parent: NodeRef, ident: impl Into<String>) -> Result<NodeRef, TreeError> {
        self.resolve(parent)?;
        let id = self.push_slot(ident.into(), Some(parent.id));
        self.nodes[parent.id.0]
            .children
            .get_or_insert_with(Vec::new)
            .push(id);
        Ok(self.make_ref(id))
    }

    /// Gives the node a present-but-empty children list, so it renders as
    /// expandable without contributing any rows.
    ///
    /// # Errors
    /// `InvalidReference` if `node` is not part of the current tree.
    pub fn mark_expandable(&mut self, node: NodeRef) -> Result<(), TreeError> {
        self.resolve(node)?;
        self.nodes[node.id.0].children.get_or_insert_with(Vec::new);
        Ok(())
    }

    /// Number of root nodes in a section.
    ///
    /// # Errors
    /// `IndexOutOfRange` if the section does not exist.
    pub fn root_count(&self, section: usize) -> Result<usize, TreeError> {
        Ok(self.section_roots_checked(section)?.len())
    }

    /// Number of children of `parent`, or the root count when `parent` is
    /// `None`. A leaf (absent children) has zero children.
    ///
    /// # Errors
    /// `InvalidReference` / `IndexOutOfRange` on a bad parent or section.
    pub fn child_count(&self, section: usize, parent: Option<NodeRef>) -> Result<usize, TreeError> {
        match parent {
            None => self.root_count(section),
            Some(parent) => Ok(self.resolve(parent)?.children().len()),
        }
    }

    /// Child of `parent` at `index`, or the root at `index` when `parent` is
    /// `None`.
    ///
    /// # Errors
    /// `InvalidReference` on a bad parent, `IndexOutOfRange` on a bad index.
    pub fn child(
        &self,
        section: usize,
        parent: Option<NodeRef>,
        index: usize,
    ) -> Result<NodeRef, TreeError> {
        let children = match parent {
            None => self.section_roots_checked(section)?,
            Some(parent) => self.resolve(parent)?.children(),
        };
        children
            .get(index)
            .copied()
            .map(|id| self.make_ref(id))
            .ok_or(TreeError::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    /// The node's identifier label.
    ///
    /// # Errors
    /// `InvalidReference` if `node` is not part of the current tree.
    pub fn ident(&self, node: NodeRef) -> Result<&str, TreeError> {
        Ok(self.resolve(node)?.ident())
    }

    /// Whether the node's children list is present (possibly empty).
    ///
    /// # Errors
    /// `InvalidReference` if `node` is not part of the current tree.
    pub fn is_expandable(&self, node: NodeRef) -> Result<bool, TreeError> {
        Ok(self.resolve(node)?.is_expandable())
    }

    /// The node's parent, or `None` for roots.
    ///
    /// # Errors
    /// `InvalidReference` if `node` is not part of the current tree.
    pub fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>, TreeError> {
        Ok(self.resolve(node)?.parent.map(|id| self.make_ref(id)))
    }

    /// Returns `true` if the reference is valid against the current tree.
    #[must_use]
    pub fn contains(&self, node: NodeRef) -> bool {
        node.epoch == self.epoch && node.id.0 < self.nodes.len()
    }

    /// Position of the node in its section's root list, or `None` if it is
    /// not a root.
    ///
    /// # Errors
    /// `InvalidReference` if `node` is not part of the current tree.
    pub fn root_position(&self, node: NodeRef) -> Result<Option<(usize, usize)>, TreeError> {
        let slot = self.resolve(node)?;
        if slot.parent.is_some() {
            return Ok(None);
        }
        for (section, roots) in self.sections.iter().enumerate() {
            if let Some(pos) = roots.iter().position(|&id| id == node.id) {
                return Ok(Some((section, pos)));
            }
        }
        Ok(None)
    }

    pub(crate) fn resolve(&self, node: NodeRef) -> Result<&NodeSlot, TreeError> {
        if self.contains(node) {
            Ok(&self.nodes[node.id.0])
        } else {
            Err(TreeError::InvalidReference)
        }
    }

    pub(crate) fn slot(&self, id: NodeId) -> &NodeSlot {
        &self.nodes[id.0]
    }

    pub(crate) const fn make_ref(&self, id: NodeId) -> NodeRef {
        NodeRef {
            id,
            epoch: self.epoch,
        }
    }

    pub(crate) fn section_roots(&self, section: usize) -> &[NodeId] {
        &self.sections[section]
    }

    pub(crate) fn remove_root(&mut self, section: usize, pos: usize) -> NodeId {
        self.sections[section].remove(pos)
    }

    pub(crate) fn insert_root_id(&mut self, section: usize, pos: usize, id: NodeId) {
        self.sections[section].insert(pos, id);
    }

    fn section_roots_checked(&self, section: usize) -> Result<&[NodeId], TreeError> {
        self.sections
            .get(section)
            .map(Vec::as_slice)
            .ok_or(TreeError::IndexOutOfRange {
                index: section,
                len: self.sections.len(),
            })
    }

    fn push_slot(&mut self, ident: String, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSlot {
            ident,
            parent,
            children: None,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expandable_iff_children_present() {
        let mut arena = TreeArena::new();
        let leaf = arena.add_root(0, "leaf").unwrap();
        let parent = arena.add_root(0, "parent").unwrap();
        let hollow = arena.add_root(0, "hollow").unwrap();
        arena.add_child(parent, "child").unwrap();
        arena.mark_expandable(hollow).unwrap();

        assert!(!arena.is_expandable(leaf).unwrap());
        assert!(arena.is_expandable(parent).unwrap());
        // Empty-but-present children still count as expandable.
        assert!(arena.is_expandable(hollow).unwrap());
        assert_eq!(arena.child_count(0, Some(hollow)).unwrap(), 0);
    }

    #[test]
    fn child_count_without_parent_is_root_count() {
        let mut arena = TreeArena::new();
        arena.add_root(0, "a").unwrap();
        arena.add_root(0, "b").unwrap();

        assert_eq!(arena.child_count(0, None).unwrap(), 2);
        assert_eq!(arena.root_count(0).unwrap(), 2);
    }

    #[test]
    fn child_lookup_checks_bounds() {
        let mut arena = TreeArena::new();
        let a = arena.add_root(0, "a").unwrap();
        arena.add_child(a, "a1").unwrap();

        assert_eq!(arena.ident(arena.child(0, Some(a), 0).unwrap()).unwrap(), "a1");
        assert_eq!(
            arena.child(0, Some(a), 1),
            Err(TreeError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn clear_invalidates_references() {
        let mut arena = TreeArena::new();
        let a = arena.add_root(0, "a").unwrap();
        arena.clear();

        assert!(!arena.contains(a));
        assert_eq!(arena.ident(a), Err(TreeError::InvalidReference));
        assert_eq!(arena.root_count(0).unwrap(), 0);
    }

    #[test]
    fn parents_are_derivable() {
        let mut arena = TreeArena::new();
        let a = arena.add_root(0, "a").unwrap();
        let a1 = arena.add_child(a, "a1").unwrap();

        assert_eq!(arena.parent(a1).unwrap(), Some(a));
        assert_eq!(arena.parent(a).unwrap(), None);
        assert_eq!(arena.root_position(a).unwrap(), Some((0, 0)));
        assert_eq!(arena.root_position(a1).unwrap(), None);
    }
}
