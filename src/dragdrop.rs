//! Drag-and-drop reordering at the root level.
//!
//! Rows export their identifier as a plain-text payload. A drop is split in
//! two: [`PendingDrop::begin`] records the destination while the gesture
//! resolves, and [`PendingDrop::complete`] applies the mutation once the
//! payloads have materialized. Payload loading is asynchronous relative to
//! the gesture, so completion re-checks the arena epoch and projection
//! generation and fails with [`TreeError::StaleProjection`] when a reset
//! interleaved; callers discard that error silently.

use crate::arena::{NodeRef, TreeArena};
use crate::change::{RowChange, RowChanges};
use crate::error::TreeError;
use crate::state::TreeListState;

/// How a drop session is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOperation {
    /// The session is rejected; nothing happens on drop.
    Cancel,
    /// The payloads are inserted as new rows (cross-application drops).
    Copy,
    /// The dragged row is moved: removed from its source position and
    /// inserted at the destination (local drags only).
    Move,
}

/// An active drag session, as presented to the drop target.
#[derive(Clone, Copy, Debug)]
pub struct DragSession {
    item_count: usize,
    source: Option<NodeRef>,
}

impl DragSession {
    /// A session originating outside the application, carrying `item_count`
    /// plain-text payloads.
    #[must_use]
    pub const fn external(item_count: usize) -> Self {
        Self {
            item_count,
            source: None,
        }
    }

    /// A session dragging rows of this tree, starting at `source`.
    #[must_use]
    pub const fn local(source: NodeRef, item_count: usize) -> Self {
        Self {
            item_count,
            source: Some(source),
        }
    }

    /// Number of items carried by the session.
    #[must_use]
    pub const fn item_count(&self) -> usize {
        self.item_count
    }

    /// Whether the session started on a row of this tree.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.source.is_some()
    }

    /// Resolves the session into a drop operation.
    ///
    /// A move is only offered for local single-item sessions; local sessions
    /// carrying more than one item are cancelled outright. External sessions
    /// are accepted as copy-inserts.
    #[must_use]
    pub const fn proposal(&self) -> DropOperation {
        if self.is_local() {
            if self.item_count > 1 {
                DropOperation::Cancel
            } else {
                DropOperation::Move
            }
        } else {
            DropOperation::Copy
        }
    }
}

/// Plain-text drag payload for the row at a flattened index.
///
/// # Errors
/// `IndexOutOfRange` on a bad section or row index; `InvalidReference` when
/// the projection is stale against the arena.
pub fn drag_payload(
    arena: &TreeArena,
    state: &TreeListState,
    section: usize,
    row: usize,
) -> Result<String, TreeError> {
    Ok(state.row(arena, section, row)?.ident.to_owned())
}

/// A drop whose payloads have not materialized yet.
///
/// Captures the destination and the epoch/generation pair at gesture time,
/// so a completion that arrives after a reset can be told apart from a live
/// one.
#[derive(Clone, Copy, Debug)]
pub struct PendingDrop {
    section: usize,
    root_pos: usize,
    operation: DropOperation,
    source: Option<NodeRef>,
    epoch: u64,
    generation: u64,
}

impl PendingDrop {
    /// Records a drop of `session` at `destination` (`(section, flat row)`).
    ///
    /// A missing destination appends at the end of the last section.
    /// Destinations inside an expanded subtree snap to the root level, since
    /// reordering applies only to roots.
    ///
    /// # Errors
    /// `IndexOutOfRange` on a destination section that does not exist;
    /// `InvalidReference` when the projection is stale against the arena.
    pub fn begin(
        arena: &TreeArena,
        state: &TreeListState,
        session: &DragSession,
        destination: Option<(usize, usize)>,
    ) -> Result<Self, TreeError> {
        if state.projection_epoch() != arena.epoch() {
            return Err(TreeError::InvalidReference);
        }
        let (section, root_pos) = match destination {
            Some((section, row)) => {
                let len = state.visible_row_count(section)?;
                let pos = if row >= len {
                    arena.root_count(section)?
                } else {
                    root_slot_before(state, section, row)
                };
                (section, pos)
            }
            None => {
                let section = arena.section_count() - 1;
                (section, arena.root_count(section)?)
            }
        };
        Ok(Self {
            section,
            root_pos,
            operation: session.proposal(),
            source: session.source,
            epoch: arena.epoch(),
            generation: state.generation(),
        })
    }

    /// The operation this drop will perform.
    #[must_use]
    pub const fn operation(&self) -> DropOperation {
        self.operation
    }

    /// Applies the drop once its payloads have loaded.
    ///
    /// A cancelled session or an empty payload list (the item provider
    /// failed) completes without mutation. Copy inserts one leaf root per
    /// payload at the recorded position; move removes the source root and
    /// reinserts it at the destination. Returns the row changes to apply.
    ///
    /// # Errors
    /// `StaleProjection` if the arena or projection was reset since
    /// [`Self::begin`]; `InvalidReference` if a move source is not a root of
    /// the current tree.
    pub fn complete(
        self,
        arena: &mut TreeArena,
        state: &mut TreeListState,
        payloads: &[String],
    ) -> Result<RowChanges, TreeError> {
        if arena.epoch() != self.epoch || state.generation() != self.generation {
            return Err(TreeError::StaleProjection);
        }

        match self.operation {
            DropOperation::Cancel => Ok(RowChanges::new()),
            DropOperation::Copy => self.complete_copy(arena, state, payloads),
            DropOperation::Move => self.complete_move(arena, state),
        }
    }

    fn complete_copy(
        self,
        arena: &mut TreeArena,
        state: &mut TreeListState,
        payloads: &[String],
    ) -> Result<RowChanges, TreeError> {
        if payloads.is_empty() {
            return Ok(RowChanges::new());
        }
        let mut first = None;
        for (i, payload) in payloads.iter().enumerate() {
            let node = arena.insert_root(self.section, self.root_pos + i, payload.clone())?;
            first.get_or_insert(node);
        }
        state.invalidate();
        state.ensure_projection(arena);

        let start = first
            .and_then(|node| state.locate(node.id()))
            .map_or(0, |(_, row)| row);
        let mut changes = RowChanges::new();
        changes.push(RowChange::Inserted {
            section: self.section,
            start,
            count: payloads.len(),
        });
        Ok(changes)
    }

    fn complete_move(
        self,
        arena: &mut TreeArena,
        state: &mut TreeListState,
    ) -> Result<RowChanges, TreeError> {
        let source = self.source.ok_or(TreeError::InvalidReference)?;
        let (src_section, src_pos) = arena
            .root_position(source)?
            .ok_or(TreeError::InvalidReference)?;
        let (_, src_row) = state
            .locate(source.id())
            .ok_or(TreeError::InvalidReference)?;

        // Removing the source shifts destinations behind it by one.
        let mut dest_pos = self.root_pos;
        if src_section == self.section && src_pos < dest_pos {
            dest_pos -= 1;
        }
        let id = arena.remove_root(src_section, src_pos);
        arena.insert_root_id(self.section, dest_pos, id);
        state.invalidate();
        state.ensure_projection(arena);

        let (_, new_row) = state.locate(id).ok_or(TreeError::InvalidReference)?;
        let mut changes = RowChanges::new();
        changes.push(RowChange::Removed {
            section: src_section,
            start: src_row,
            count: 1,
        });
        changes.push(RowChange::Inserted {
            section: self.section,
            start: new_row,
            count: 1,
        });
        Ok(changes)
    }
}

// Number of root-level rows strictly before `row`; for a root row this is
// its own position in the root list.
fn root_slot_before(state: &TreeListState, section: usize, row: usize) -> usize {
    state.visible_rows(section)[..row]
        .iter()
        .filter(|r| r.depth == 0)
        .count()
}
