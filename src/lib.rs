//! Hierarchical tree-list driver and widget for ratatui.
//!
//! [`TreeArena`] owns the node tree (one tree per section);
//! [`TreeListState`] projects it into a flattened visible-row list driven by
//! expand/collapse state and reports structural changes as [`RowChange`]s;
//! [`TreeListView`] renders one section. Root rows can be reordered through
//! the [`dragdrop`] module.
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings and `TreeListState::handle_key*` helpers.
//! - `sample`: random demo-tree generator with an injected `rand` source.
//! - `serde`: serde support for [`TreeListSnapshot`].

mod action;
mod arena;
mod change;
mod context;
pub mod dragdrop;
mod error;
mod glyphs;
#[cfg(feature = "keymap")]
mod keymap;
pub mod prelude;
#[cfg(feature = "sample")]
mod sample;
mod state;
mod style;
mod widget;

pub use action::{TreeAction, TreeEvent};
pub use arena::{NodeId, NodeRef, TreeArena};
pub use change::{RowChange, RowChanges};
pub use context::TreeRowContext;
pub use dragdrop::{DragSession, DropOperation, PendingDrop, drag_payload};
pub use error::TreeError;
pub use glyphs::{TreeGlyphs, tree_row_line};
#[cfg(feature = "keymap")]
pub use keymap::{KeymapProfile, TreeKeyBindings};
#[cfg(feature = "sample")]
pub use sample::{SampleTreeConfig, populate_sample_tree};
pub use state::{RowInfo, TreeListSnapshot, TreeListState, VisibleRow};
pub use style::{TreeListViewStyle, TreeScrollPolicy};
pub use widget::TreeListView;
