use ratatui::widgets::ListState;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::action::{TreeAction, TreeEvent};
use crate::arena::{NodeId, NodeRef, TreeArena};
use crate::change::{RowChange, RowChanges};
use crate::error::TreeError;
use crate::style::TreeScrollPolicy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::KeyEvent;

/// A visible row of the flattened projection, with metadata used for
/// rendering and navigation.
#[derive(Clone)]
pub struct VisibleRow {
    pub(crate) node: NodeId,
    pub(crate) depth: u16,
    pub(crate) parent: Option<NodeId>,
    pub(crate) expandable: bool,
    pub(crate) is_tail_stack: SmallVec<[bool; 8]>,
}

/// Row content resolved against the arena, as handed to a hosting list view.
#[derive(Clone, Copy, Debug)]
pub struct RowInfo<'a> {
    /// Reference to the row's node.
    pub node: NodeRef,
    /// The node's identifier label.
    pub ident: &'a str,
    /// Nesting depth (roots are 0).
    pub depth: u16,
    /// Parent node, or `None` for roots.
    pub parent: Option<NodeRef>,
    /// Whether the node carries a (possibly empty) children list.
    pub expandable: bool,
    /// Whether the node is currently expanded.
    pub expanded: bool,
}

/// Driver state: expansion marks, selection, and the visible-row projection.
///
/// The projection is a pre-order walk of each section's tree restricted to
/// expanded branches, rebuilt wholesale on every structural change. Collapsing
/// a node keeps the expansion marks of its descendants, so re-expanding
/// restores the previously visible depth.
pub struct TreeListState {
    list_state: ListState,
    focused_section: usize,
    expanded: FxHashSet<NodeId>,
    // One flattened row list per arena section.
    visible: Vec<Vec<VisibleRow>>,
    // Fast lookup from node id to (section, row).
    visible_index: FxHashMap<NodeId, (usize, usize)>,
    dirty: bool,
    // Arena epoch the projection was last built against; a mismatch means
    // the arena was cleared and every projected id is stale.
    projection_epoch: u64,
    // Bumped by reset(); pending drops taken before the bump are stale.
    generation: u64,
    draw_lines: bool,
    #[cfg(feature = "keymap")]
    keymap: TreeKeyBindings,
}

/// Snapshot of session state (expansion, selection, view options).
///
/// With the `serde` feature enabled, this type derives
/// `Serialize`/`Deserialize`. A snapshot is only meaningful against the same
/// arena contents it was taken from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct TreeListSnapshot {
    /// Expanded node ids.
    pub expanded: Vec<NodeId>,
    /// Selected row index within the focused section.
    pub selected: Option<usize>,
    /// Scroll offset within the focused section.
    pub offset: usize,
    /// Section that selection and offset apply to.
    pub focused_section: usize,
    /// Whether guide lines were enabled.
    pub draw_lines: bool,
}

impl Default for TreeListState {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeListState {
    /// Creates a new empty state with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a state with preallocated capacity for the given node count.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list_state: ListState::default(),
            focused_section: 0,
            expanded: FxHashSet::with_capacity_and_hasher(capacity, FxBuildHasher),
            visible: Vec::new(),
            visible_index: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            dirty: true,
            projection_epoch: 0,
            generation: 0,
            draw_lines: true,
            #[cfg(feature = "keymap")]
            keymap: TreeKeyBindings::new(),
        }
    }

    #[cfg(feature = "keymap")]
    /// Returns a mutable reference to the key binding set.
    pub const fn keymap_mut(&mut self) -> &mut TreeKeyBindings {
        &mut self.keymap
    }

    pub(crate) const fn list_state(&self) -> &ListState {
        &self.list_state
    }

    pub(crate) const fn list_state_mut(&mut self) -> &mut ListState {
        &mut self.list_state
    }

    pub(crate) fn visible_rows(&self, section: usize) -> &[VisibleRow] {
        self.visible.get(section).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn locate(&self, id: NodeId) -> Option<(usize, usize)> {
        self.visible_index.get(&id).copied()
    }

    pub(crate) const fn projection_epoch(&self) -> u64 {
        self.projection_epoch
    }

    /// Projection generation, bumped by [`Self::reset`].
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns whether guide lines are drawn.
    #[must_use]
    pub const fn draw_lines(&self) -> bool {
        self.draw_lines
    }

    /// Enables or disables drawing of guide lines.
    pub const fn set_draw_lines(&mut self, draw: bool) {
        self.draw_lines = draw;
    }

    /// Section that selection and key handling apply to.
    #[must_use]
    pub const fn focused_section(&self) -> usize {
        self.focused_section
    }

    /// Moves focus (and selection) to another section.
    pub fn set_focused_section(&mut self, section: usize) {
        if section != self.focused_section {
            self.focused_section = section;
            self.list_state.select(None);
        }
    }

    /// Marks the projection as dirty after the arena was edited directly.
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Rebuilds the visible-row projection if it is marked dirty or was
    /// built against an arena that has since been cleared.
    pub fn ensure_projection(&mut self, arena: &TreeArena) {
        if !self.dirty && self.projection_epoch == arena.epoch() {
            return;
        }
        self.rebuild(arena);
    }

    /// Number of sections in the last rebuilt projection.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.visible.len()
    }

    /// Size of a section's flattened projection.
    ///
    /// # Errors
    /// `IndexOutOfRange` if the section does not exist.
    pub fn visible_row_count(&self, section: usize) -> Result<usize, TreeError> {
        self.visible
            .get(section)
            .map(Vec::len)
            .ok_or(TreeError::IndexOutOfRange {
                index: section,
                len: self.visible.len(),
            })
    }

    /// Row content at a flattened index.
    ///
    /// # Errors
    /// `IndexOutOfRange` on a bad section or row index; `InvalidReference`
    /// when the arena was cleared since the projection was built (call
    /// [`Self::ensure_projection`] to catch up first).
    pub fn row<'a>(
        &self,
        arena: &'a TreeArena,
        section: usize,
        index: usize,
    ) -> Result<RowInfo<'a>, TreeError> {
        if self.projection_epoch != arena.epoch() {
            return Err(TreeError::InvalidReference);
        }
        let rows = self
            .visible
            .get(section)
            .ok_or(TreeError::IndexOutOfRange {
                index: section,
                len: self.visible.len(),
            })?;
        let row = rows.get(index).ok_or(TreeError::IndexOutOfRange {
            index,
            len: rows.len(),
        })?;
        Ok(RowInfo {
            node: arena.make_ref(row.node),
            ident: arena.slot(row.node).ident(),
            depth: row.depth,
            parent: row.parent.map(|id| arena.make_ref(id)),
            expandable: row.expandable,
            expanded: self.expanded.contains(&row.node),
        })
    }

    /// Whether the node is currently marked expanded.
    ///
    /// Stale references simply report `false`.
    #[must_use]
    pub fn is_expanded(&self, node: NodeRef) -> bool {
        self.expanded.contains(&node.id())
    }

    /// Toggles the node between Collapsed and Expanded.
    ///
    /// Expanding reveals one level (descendants that kept their own marks
    /// reappear at their prior depth). Collapsing removes every currently
    /// visible descendant row but preserves descendant marks. Toggling a leaf
    /// is a no-op. Returns the row changes a hosting list view must apply.
    ///
    /// # Errors
    /// `InvalidReference` if `node` is not part of the current tree.
    pub fn toggle(&mut self, arena: &TreeArena, node: NodeRef) -> Result<RowChanges, TreeError> {
        let expand = !self.expanded.contains(&node.id());
        self.apply_expansion(arena, node, expand)
    }

    /// Sets the node's expansion state explicitly. See [`Self::toggle`].
    ///
    /// # Errors
    /// `InvalidReference` if `node` is not part of the current tree.
    pub fn set_expanded(
        &mut self,
        arena: &TreeArena,
        node: NodeRef,
        expand: bool,
    ) -> Result<RowChanges, TreeError> {
        self.apply_expansion(arena, node, expand)
    }

    /// Marks every expandable node in the arena as expanded.
    pub fn expand_all(&mut self, arena: &TreeArena) -> RowChanges {
        self.expanded.clear();
        let extra = arena.len().saturating_sub(self.expanded.capacity());
        if extra > 0 {
            self.expanded.reserve(extra);
        }
        let mut stack = Vec::with_capacity(arena.len().max(1));
        for section in 0..arena.section_count() {
            stack.extend_from_slice(arena.section_roots(section));
        }
        while let Some(id) = stack.pop() {
            let slot = arena.slot(id);
            if slot.is_expandable() {
                self.expanded.insert(id);
                stack.extend_from_slice(slot.children());
            }
        }
        self.dirty = true;
        self.rebuild(arena);
        self.reload_all_changes()
    }

    /// Collapses every node, discarding all expansion marks.
    pub fn collapse_all(&mut self, arena: &TreeArena) -> RowChanges {
        self.expanded.clear();
        self.dirty = true;
        self.rebuild(arena);
        self.reload_all_changes()
    }

    /// Discards all expansion state and rebuilds the projection as root rows
    /// only. Bumps the generation so pending drops taken earlier become stale.
    pub fn reset(&mut self, arena: &TreeArena) -> RowChanges {
        self.expanded.clear();
        self.generation += 1;
        self.list_state.select(None);
        self.dirty = true;
        self.rebuild(arena);
        self.reload_all_changes()
    }

    /// Selects the first visible row of the focused section.
    pub fn select_first(&mut self) {
        self.list_state.select_first();
    }

    /// Selects the last visible row of the focused section.
    pub fn select_last(&mut self) {
        let len = self.visible_rows(self.focused_section).len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(len - 1));
        }
    }

    /// Moves selection to the previous visible row.
    pub fn select_prev(&mut self) {
        if self.visible_rows(self.focused_section).is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(selected.saturating_sub(1)));
    }

    /// Moves selection to the next visible row.
    pub fn select_next(&mut self) {
        let len = self.visible_rows(self.focused_section).len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some((selected + 1).min(len - 1)));
    }

    /// Moves selection to the parent of the selected row, if visible.
    pub fn select_parent(&mut self) {
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let Some(parent) = self
            .visible_rows(self.focused_section)
            .get(selected)
            .and_then(|row| row.parent)
        else {
            return;
        };
        if let Some(&(section, row)) = self.visible_index.get(&parent)
            && section == self.focused_section
        {
            self.list_state.select(Some(row));
        }
    }

    /// Selected row index within the focused section.
    #[must_use]
    pub fn selected_row(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Selects a row in the focused section by flattened index.
    pub fn select_row(&mut self, row: Option<usize>) {
        self.list_state.select(row);
        self.clamp_selection();
    }

    /// Reference to the selected row's node, if any.
    #[must_use]
    pub fn selected_ref(&self, arena: &TreeArena) -> Option<NodeRef> {
        if self.projection_epoch != arena.epoch() {
            return None;
        }
        self.list_state.selected().and_then(|idx| {
            self.visible_rows(self.focused_section)
                .get(idx)
                .map(|row| arena.make_ref(row.node))
        })
    }

    /// Adjusts scroll offset so the selection is within the viewport.
    pub fn ensure_selection_visible(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let offset = self.list_state.offset();
        if selected < offset {
            *self.list_state.offset_mut() = selected;
        } else if selected >= offset + viewport_height {
            *self.list_state.offset_mut() = selected + 1 - viewport_height;
        }
    }

    /// Adjusts selection visibility according to the provided scroll policy.
    pub fn ensure_selection_visible_with_policy(
        &mut self,
        viewport_height: usize,
        policy: TreeScrollPolicy,
    ) {
        match policy {
            TreeScrollPolicy::KeepInView => self.ensure_selection_visible(viewport_height),
            TreeScrollPolicy::CenterOnSelect => {
                self.ensure_selection_visible_centered(viewport_height);
            }
        }
    }

    /// Captures a snapshot of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> TreeListSnapshot {
        TreeListSnapshot {
            expanded: self.expanded.iter().copied().collect(),
            selected: self.list_state.selected(),
            offset: self.list_state.offset(),
            focused_section: self.focused_section,
            draw_lines: self.draw_lines,
        }
    }

    /// Restores session state from a previously captured snapshot.
    pub fn restore(&mut self, snapshot: TreeListSnapshot) {
        self.expanded = snapshot.expanded.into_iter().collect();
        self.focused_section = snapshot.focused_section;
        self.draw_lines = snapshot.draw_lines;
        *self.list_state.offset_mut() = snapshot.offset;
        self.list_state.select(snapshot.selected);
        self.dirty = true;
    }

    /// Handles a tree action and returns the resulting event.
    pub fn handle_action<C>(&mut self, arena: &TreeArena, action: TreeAction<C>) -> TreeEvent<C> {
        self.ensure_projection(arena);
        match action {
            // Forwarded to the caller; valid even on an empty projection.
            TreeAction::Reset | TreeAction::Custom(_) => TreeEvent::Action(action),
            TreeAction::ToggleGuides => {
                self.draw_lines = !self.draw_lines;
                TreeEvent::Handled
            }
            _ if self.visible_rows(self.focused_section).is_empty() => TreeEvent::Unhandled,
            TreeAction::SelectPrev => {
                self.select_prev();
                TreeEvent::Handled
            }
            TreeAction::SelectNext => {
                self.select_next();
                TreeEvent::Handled
            }
            TreeAction::SelectParent => {
                self.select_parent();
                TreeEvent::Handled
            }
            TreeAction::SelectFirst => {
                self.select_first();
                TreeEvent::Handled
            }
            TreeAction::SelectLast => {
                self.select_last();
                TreeEvent::Handled
            }
            TreeAction::ToggleNode => {
                let Some(node) = self.selected_ref(arena) else {
                    return TreeEvent::Unhandled;
                };
                match self.toggle(arena, node) {
                    Ok(changes) if !changes.is_empty() => TreeEvent::Mutated(changes),
                    _ => TreeEvent::Unhandled,
                }
            }
            TreeAction::ExpandAll => TreeEvent::Mutated(self.expand_all(arena)),
            TreeAction::CollapseAll => TreeEvent::Mutated(self.collapse_all(arena)),
        }
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event into an action and handles it.
    pub fn handle_key(&mut self, arena: &TreeArena, key: KeyEvent) -> TreeEvent<()> {
        let Some(action) = self.keymap.resolve(key) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action(arena, action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event with a custom mapping and handles it.
    pub fn handle_key_with<C, F>(
        &mut self,
        arena: &TreeArena,
        key: KeyEvent,
        custom: F,
    ) -> TreeEvent<C>
    where
        F: Fn(KeyEvent) -> Option<C>,
    {
        let Some(action) = self.keymap.resolve_with(key, custom) else {
            return TreeEvent::Unhandled;
        };
        self.handle_action(arena, action)
    }

    fn apply_expansion(
        &mut self,
        arena: &TreeArena,
        node: NodeRef,
        expand: bool,
    ) -> Result<RowChanges, TreeError> {
        let expandable = arena.resolve(node)?.is_expandable();
        if !expandable {
            return Ok(RowChanges::new());
        }
        self.ensure_projection(arena);

        let id = node.id();
        if expand == self.expanded.contains(&id) {
            return Ok(RowChanges::new());
        }
        let located = self.visible_index.get(&id).copied();
        if expand {
            self.expanded.insert(id);
        } else {
            self.expanded.remove(&id);
        }
        self.dirty = true;

        // The node itself is hidden behind a collapsed ancestor: the mark
        // changed but no visible row did.
        let Some((section, row)) = located else {
            self.rebuild(arena);
            return Ok(RowChanges::new());
        };

        let old_len = self.visible[section].len();
        self.rebuild(arena);
        let new_len = self.visible[section].len();

        let mut changes = RowChanges::new();
        changes.push(RowChange::Updated { section, row });
        if new_len > old_len {
            changes.push(RowChange::Inserted {
                section,
                start: row + 1,
                count: new_len - old_len,
            });
        } else if old_len > new_len {
            changes.push(RowChange::Removed {
                section,
                start: row + 1,
                count: old_len - new_len,
            });
        }
        Ok(changes)
    }

    pub(crate) fn rebuild(&mut self, arena: &TreeArena) {
        let sections = arena.section_count();
        self.visible.resize_with(sections, Vec::new);
        self.visible_index.clear();
        let extra = arena.len().saturating_sub(self.visible_index.capacity());
        if extra > 0 {
            self.visible_index.reserve(extra);
        }
        for section in 0..sections {
            self.visible[section].clear();
            let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
            for root in arena.section_roots(section).to_vec() {
                self.build_rows(arena, section, root, 0, None, &mut is_tail_stack);
            }
        }
        self.dirty = false;
        self.projection_epoch = arena.epoch();
        self.clamp_selection();
    }

    fn build_rows(
        &mut self,
        arena: &TreeArena,
        section: usize,
        id: NodeId,
        depth: u16,
        parent: Option<NodeId>,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
    ) {
        let slot = arena.slot(id);
        let expandable = slot.is_expandable();
        let row = self.visible[section].len();
        self.visible[section].push(VisibleRow {
            node: id,
            depth,
            parent,
            expandable,
            is_tail_stack: is_tail_stack.clone(),
        });
        self.visible_index.insert(id, (section, row));

        if !expandable || !self.expanded.contains(&id) {
            return;
        }
        let children = slot.children().to_vec();
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            is_tail_stack.push(i == last);
            self.build_rows(arena, section, child, depth + 1, Some(id), is_tail_stack);
            is_tail_stack.pop();
        }
    }

    fn reload_all_changes(&self) -> RowChanges {
        (0..self.visible.len())
            .map(|section| RowChange::ReloadSection { section })
            .collect()
    }

    fn ensure_selection_visible_centered(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let total = self.visible_rows(self.focused_section).len();
        if total <= viewport_height {
            *self.list_state.offset_mut() = 0;
            return;
        }

        // Center selection, then clamp to valid scroll range.
        let half = viewport_height / 2;
        let mut offset = selected.saturating_sub(half);
        let max_offset = total.saturating_sub(viewport_height);
        if offset > max_offset {
            offset = max_offset;
        }
        *self.list_state.offset_mut() = offset;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_rows(self.focused_section).len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        if let Some(selected) = self.list_state.selected()
            && selected >= len
        {
            self.list_state.select(Some(len - 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Root has A, B, C; B has children B1, B2.
    fn demo_arena() -> (TreeArena, NodeRef, NodeRef, NodeRef) {
        let mut arena = TreeArena::new();
        let a = arena.add_root(0, "A").unwrap();
        let b = arena.add_root(0, "B").unwrap();
        arena.add_root(0, "C").unwrap();
        let b1 = arena.add_child(b, "B1").unwrap();
        arena.add_child(b, "B2").unwrap();
        (arena, a, b, b1)
    }

    fn idents(state: &TreeListState, arena: &TreeArena) -> Vec<String> {
        (0..state.visible_row_count(0).unwrap())
            .map(|i| state.row(arena, 0, i).unwrap().ident.to_string())
            .collect()
    }

    #[test]
    fn reset_projects_roots_only() {
        let (arena, _, _, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);

        assert_eq!(
            state.visible_row_count(0).unwrap(),
            arena.root_count(0).unwrap()
        );
        assert_eq!(idents(&state, &arena), ["A", "B", "C"]);
    }

    #[test]
    fn expand_then_collapse_round_trips() {
        let (arena, _, b, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);

        let changes = state.toggle(&arena, b).unwrap();
        assert_eq!(state.visible_row_count(0).unwrap(), 5);
        assert_eq!(state.row(&arena, 0, 2).unwrap().ident, "B1");
        assert_eq!(state.row(&arena, 0, 3).unwrap().ident, "B2");
        assert_eq!(
            changes.as_slice(),
            [
                RowChange::Updated { section: 0, row: 1 },
                RowChange::Inserted {
                    section: 0,
                    start: 2,
                    count: 2
                },
            ]
        );

        let changes = state.toggle(&arena, b).unwrap();
        assert_eq!(state.visible_row_count(0).unwrap(), 3);
        assert!(!state.is_expanded(b));
        assert_eq!(
            changes.as_slice(),
            [
                RowChange::Updated { section: 0, row: 1 },
                RowChange::Removed {
                    section: 0,
                    start: 2,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn expanding_empty_children_flips_state_without_rows() {
        let mut arena = TreeArena::new();
        arena.add_root(0, "a").unwrap();
        let hollow = arena.add_root(0, "hollow").unwrap();
        arena.mark_expandable(hollow).unwrap();
        let mut state = TreeListState::new();
        state.reset(&arena);

        let changes = state.toggle(&arena, hollow).unwrap();
        assert!(state.is_expanded(hollow));
        assert!(state.row(&arena, 0, 1).unwrap().expanded);
        assert_eq!(state.visible_row_count(0).unwrap(), 2);
        assert_eq!(
            changes.as_slice(),
            [RowChange::Updated { section: 0, row: 1 }]
        );
    }

    #[test]
    fn toggling_a_leaf_is_a_no_op() {
        let (arena, a, _, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);

        let changes = state.toggle(&arena, a).unwrap();
        assert!(changes.is_empty());
        assert!(!state.is_expanded(a));
    }

    #[test]
    fn collapse_removes_nested_expansion_rows_but_keeps_marks() {
        let mut arena = TreeArena::new();
        let b = arena.add_root(0, "B").unwrap();
        let b1 = arena.add_child(b, "B1").unwrap();
        arena.add_child(b, "B2").unwrap();
        arena.add_child(b1, "B1a").unwrap();
        arena.add_child(b1, "B1b").unwrap();
        let mut state = TreeListState::new();
        state.reset(&arena);

        state.toggle(&arena, b).unwrap();
        state.toggle(&arena, b1).unwrap();
        assert_eq!(state.visible_row_count(0).unwrap(), 5);

        // Collapsing B removes all four visible descendants in one go.
        let changes = state.toggle(&arena, b).unwrap();
        assert_eq!(state.visible_row_count(0).unwrap(), 1);
        assert_eq!(
            changes.as_slice(),
            [
                RowChange::Updated { section: 0, row: 0 },
                RowChange::Removed {
                    section: 0,
                    start: 1,
                    count: 4
                },
            ]
        );

        // B1 kept its mark: re-expanding B restores the prior depth.
        assert!(state.is_expanded(b1));
        state.toggle(&arena, b).unwrap();
        assert_eq!(state.visible_row_count(0).unwrap(), 5);
    }

    #[test]
    fn expanding_hidden_node_changes_no_rows() {
        let mut arena = TreeArena::new();
        let b = arena.add_root(0, "B").unwrap();
        let b1 = arena.add_child(b, "B1").unwrap();
        arena.add_child(b1, "B1a").unwrap();
        let mut state = TreeListState::new();
        state.reset(&arena);

        // B is collapsed, so B1 is not visible.
        let changes = state.toggle(&arena, b1).unwrap();
        assert!(changes.is_empty());
        assert!(state.is_expanded(b1));
        assert_eq!(state.visible_row_count(0).unwrap(), 1);
    }

    #[test]
    fn reset_discards_marks_and_bumps_generation() {
        let (arena, _, b, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);
        let generation = state.generation();

        state.toggle(&arena, b).unwrap();
        state.reset(&arena);

        assert!(!state.is_expanded(b));
        assert_eq!(state.visible_row_count(0).unwrap(), 3);
        assert_eq!(state.generation(), generation + 1);
    }

    #[test]
    fn row_depths_follow_preorder() {
        let (arena, _, b, b1) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);
        state.toggle(&arena, b).unwrap();

        let depths: Vec<u16> = (0..5)
            .map(|i| state.row(&arena, 0, i).unwrap().depth)
            .collect();
        assert_eq!(depths, [0, 0, 1, 1, 0]);
        assert_eq!(state.row(&arena, 0, 2).unwrap().node, b1);
        assert_eq!(state.row(&arena, 0, 2).unwrap().parent, Some(b));
    }

    #[test]
    fn row_queries_check_bounds() {
        let (arena, _, _, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);

        assert_eq!(
            state.row(&arena, 0, 3).map(|row| row.depth),
            Err(TreeError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            state.visible_row_count(1),
            Err(TreeError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn stale_reference_is_rejected() {
        let (mut arena, _, b, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);

        arena.clear();
        state.reset(&arena);
        assert_eq!(state.toggle(&arena, b), Err(TreeError::InvalidReference));
    }

    #[test]
    fn cleared_arena_invalidates_row_queries() {
        let (mut arena, _, _, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);
        state.select_row(Some(0));

        arena.clear();
        assert_eq!(
            state.row(&arena, 0, 0).map(|row| row.depth),
            Err(TreeError::InvalidReference)
        );
        assert_eq!(state.selected_ref(&arena), None);

        // Catching up rebuilds against the now-empty arena.
        state.ensure_projection(&arena);
        assert_eq!(state.visible_row_count(0).unwrap(), 0);
    }

    #[test]
    fn projection_tracks_section_count_across_arenas() {
        let two = TreeArena::with_sections(2);
        let mut state = TreeListState::new();
        state.reset(&two);
        assert_eq!(state.section_count(), 2);

        let one = TreeArena::new();
        state.invalidate();
        state.ensure_projection(&one);
        assert_eq!(state.section_count(), 1);
        assert_eq!(
            state.visible_row_count(1),
            Err(TreeError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn reset_and_custom_actions_are_forwarded() {
        let arena = TreeArena::new();
        let mut state = TreeListState::new();

        // Forwarding does not require visible rows.
        let event = state.handle_action(&arena, TreeAction::Custom(7_u8));
        assert!(matches!(event, TreeEvent::Action(TreeAction::Custom(7))));
        let event: TreeEvent = state.handle_action(&arena, TreeAction::Reset);
        assert!(matches!(event, TreeEvent::Action(TreeAction::Reset)));

        // Navigation on an empty projection has nothing to act on.
        let event: TreeEvent = state.handle_action(&arena, TreeAction::SelectNext);
        assert!(matches!(event, TreeEvent::Unhandled));
    }

    #[test]
    fn toggle_action_reports_changes() {
        let (arena, _, _, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);
        state.select_row(Some(1));

        let event: TreeEvent = state.handle_action(&arena, TreeAction::ToggleNode);
        assert!(matches!(event, TreeEvent::Mutated(_)));
        assert_eq!(state.visible_row_count(0).unwrap(), 5);

        // Toggling the leaf at row 0 has nothing to do.
        state.select_row(Some(0));
        let event: TreeEvent = state.handle_action(&arena, TreeAction::ToggleNode);
        assert!(matches!(event, TreeEvent::Unhandled));
    }

    #[test]
    fn selection_is_clamped_after_collapse() {
        let (arena, _, b, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);
        state.toggle(&arena, b).unwrap();
        state.select_row(Some(4));

        state.toggle(&arena, b).unwrap();
        assert_eq!(state.selected_row(), Some(2));
    }

    #[test]
    fn expand_all_and_collapse_all_reload_sections() {
        let (arena, _, b, _) = demo_arena();
        let mut state = TreeListState::new();
        state.reset(&arena);

        let changes = state.expand_all(&arena);
        assert_eq!(
            changes.as_slice(),
            [RowChange::ReloadSection { section: 0 }]
        );
        assert_eq!(state.visible_row_count(0).unwrap(), 5);
        assert!(state.is_expanded(b));

        state.collapse_all(&arena);
        assert_eq!(state.visible_row_count(0).unwrap(), 3);
    }
}
