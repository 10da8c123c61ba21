use crate::change::RowChanges;

/// Actions that a user or application can initiate on the tree view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Custom = ()> {
    /// Move selection to the previous visible row.
    SelectPrev,
    /// Move selection to the next visible row.
    SelectNext,
    /// Move selection to the parent node.
    SelectParent,
    /// Select the first visible row.
    SelectFirst,
    /// Select the last visible row.
    SelectLast,
    /// Toggle expansion for the selected node.
    ToggleNode,
    /// Expand every expandable node.
    ExpandAll,
    /// Collapse every node.
    CollapseAll,
    /// Request a wholesale tree reset; forwarded to the caller, which owns
    /// the arena contents.
    Reset,
    /// Toggle drawing of guide lines.
    ToggleGuides,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

/// Result of handling an action or key event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent<Custom = ()> {
    /// The action was handled internally without structural changes.
    Handled,
    /// The action changed the projection; the host list view must apply
    /// these row changes.
    Mutated(RowChanges),
    /// The action was ignored (e.g., nothing selected / nothing to do).
    Unhandled,
    /// The action is forwarded to the caller for handling.
    Action(TreeAction<Custom>),
}
