//! Append-only backing stores.
//!
//! A store is allocated once from a [`StoreCapacity`] estimate, filled by
//! sequential [`Ingest::ingest`] calls, and then treated as immutable.
//! Writes only ever advance the row and value cursors; previously written
//! entries are never moved or shrunk.

mod grouped;
mod tuples;

pub use grouped::GroupedStore;
pub use tuples::TupleStore;

use std::fmt::Debug;

use super::parse::ParseError;
use super::refvec::RefVector;

// ============================================================================
// FeatureGroup
// ============================================================================

/// One of the three feature groups a row carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    Global,
    User,
    Item,
}

impl FeatureGroup {
    /// All groups in storage order.
    pub const ALL: [FeatureGroup; 3] = [FeatureGroup::Global, FeatureGroup::User, FeatureGroup::Item];

    /// Position of this group in storage order.
    #[inline]
    pub fn position(self) -> usize {
        match self {
            FeatureGroup::Global => 0,
            FeatureGroup::User => 1,
            FeatureGroup::Item => 2,
        }
    }
}

// ============================================================================
// GroupCounts
// ============================================================================

/// Pair counts for the three feature groups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub global: usize,
    pub user: usize,
    pub item: usize,
}

impl GroupCounts {
    /// Count for one group.
    #[inline]
    pub fn get(&self, group: FeatureGroup) -> usize {
        match group {
            FeatureGroup::Global => self.global,
            FeatureGroup::User => self.user,
            FeatureGroup::Item => self.item,
        }
    }

    /// Sum over all groups.
    #[inline]
    pub fn total(&self) -> usize {
        self.global + self.user + self.item
    }
}

impl std::ops::AddAssign for GroupCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.global += rhs.global;
        self.user += rhs.user;
        self.item += rhs.item;
    }
}

// ============================================================================
// StoreCapacity
// ============================================================================

/// Final capacity a store is allocated with.
///
/// Usually produced by [`scan_capacity`](crate::data::io::scan_capacity);
/// it may overestimate but must never underestimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreCapacity {
    /// Maximum number of rows.
    pub rows: usize,
    /// Maximum number of `(index, value)` entries.
    pub values: usize,
}

impl StoreCapacity {
    pub fn new(rows: usize, values: usize) -> Self {
        Self { rows, values }
    }
}

// ============================================================================
// Segment
// ============================================================================

/// Index and value views of one feature group of one row.
#[derive(Clone, Copy, Debug)]
pub struct Segment<'a> {
    pub indices: RefVector<'a>,
    pub values: RefVector<'a>,
}

impl<'a> Segment<'a> {
    /// Segment with no entries.
    #[inline]
    pub fn empty() -> Self {
        Self {
            indices: RefVector::empty(),
            values: RefVector::empty(),
        }
    }

    /// Number of indices in the segment.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the segment has no indices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Physical layout of a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Grouped CSR: three segments per row in shared arrays.
    GroupedCsr,
    /// Flat COO: one `(user, item, rating)` triple per nonzero.
    FlatCoo,
}

// ============================================================================
// Traits
// ============================================================================

/// Read access to an immutable store.
///
/// Implementations must be cheap to query: every method is called once per
/// row per pass and must not allocate.
pub trait BackingStore: Send + Sync + Debug {
    /// Physical layout.
    fn layout(&self) -> Layout;

    /// Number of ingested rows.
    fn num_rows(&self) -> usize;

    /// Number of ingested `(index, value)` entries.
    fn num_values(&self) -> usize;

    /// Label of `row`.
    fn label(&self, row: usize) -> f32;

    /// Views of one feature group of `row`.
    fn segment(&self, row: usize, group: FeatureGroup) -> Segment<'_>;

    /// Declared pair counts of `row`.
    fn counts(&self, row: usize) -> GroupCounts {
        GroupCounts {
            global: self.segment(row, FeatureGroup::Global).len(),
            user: self.segment(row, FeatureGroup::User).len(),
            item: self.segment(row, FeatureGroup::Item).len(),
        }
    }
}

/// Line-by-line population of a store.
pub trait Ingest {
    /// Parse one line and append it.
    ///
    /// A line that fails to parse is rejected as a whole and leaves the store
    /// unchanged.
    ///
    /// # Panics
    ///
    /// Panics if appending the line would exceed the store's capacity.
    fn ingest(&mut self, line: &str) -> Result<(), ParseError>;
}
