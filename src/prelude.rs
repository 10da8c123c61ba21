pub use crate::{
    DragSession, DropOperation, NodeId, NodeRef, PendingDrop, RowChange, RowChanges, RowInfo,
    TreeAction, TreeArena, TreeError, TreeEvent, TreeGlyphs, TreeListSnapshot, TreeListState,
    TreeListView, TreeListViewStyle, TreeRowContext, TreeScrollPolicy, drag_payload,
    tree_row_line,
};

#[cfg(feature = "keymap")]
pub use crate::{KeymapProfile, TreeKeyBindings};

#[cfg(feature = "sample")]
pub use crate::{SampleTreeConfig, populate_sample_tree};
