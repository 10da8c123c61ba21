use thiserror::Error;

/// Failures surfaced by arena queries and drop completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The reference points at a node that is not part of the current tree,
    /// either because the arena was cleared since the reference was taken or
    /// because the reference was never valid.
    #[error("node reference is not part of the current tree")]
    InvalidReference,

    /// A child, row, or section index was out of bounds.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the indexed collection at query time.
        len: usize,
    },

    /// A pending drop resolved after the projection it targeted was reset.
    /// Callers are expected to discard this silently instead of surfacing it.
    #[error("projection was reset while the drop was pending")]
    StaleProjection,
}
