use smallvec::SmallVec;

/// A structural change to the visible-row projection.
///
/// Hosts that mirror the projection in their own list view apply these in
/// order to keep visual rows in sync without reloading everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowChange {
    /// `count` rows were inserted starting at `start`.
    Inserted {
        /// Section the rows belong to.
        section: usize,
        /// Flattened index of the first inserted row.
        start: usize,
        /// Number of inserted rows.
        count: usize,
    },
    /// `count` rows were removed starting at `start` (pre-removal indices).
    Removed {
        /// Section the rows belonged to.
        section: usize,
        /// Flattened index of the first removed row.
        start: usize,
        /// Number of removed rows.
        count: usize,
    },
    /// A single row changed in place (e.g. its disclosure indicator flipped).
    Updated {
        /// Section the row belongs to.
        section: usize,
        /// Flattened index of the row.
        row: usize,
    },
    /// The whole section must be reloaded.
    ReloadSection {
        /// Section to reload.
        section: usize,
    },
}

/// Changes produced by a single mutation. A toggle yields at most an update
/// plus one insert or remove, so two slots stay inline.
pub type RowChanges = SmallVec<[RowChange; 2]>;
