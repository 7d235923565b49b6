//! Flat-COO store: one `(user, item, rating)` triple per nonzero.

use crate::data::parse::{self, ParseError, Tokens};
use crate::data::refvec::RefVector;

use super::{BackingStore, FeatureGroup, Ingest, Layout, Segment, StoreCapacity};

/// Flat-COO backing store.
///
/// Every ingested line becomes one row: its user id is repeated in
/// `row_index` for each item nonzero and `row_ptr[r]..row_ptr[r + 1]` spans
/// the row's triples. Rows expose no global features and label `0.0`; the
/// user group is a single index (the user id) with no value.
#[derive(Clone, Debug)]
pub struct TupleStore {
    capacity: StoreCapacity,
    row_index: Vec<u32>,
    col_index: Vec<u32>,
    values: Vec<f32>,
    row_ptr: Vec<u32>,
    scratch: Vec<(u32, f32)>,
}

impl TupleStore {
    /// Allocate a store with final capacity.
    pub fn new(capacity: StoreCapacity) -> Self {
        assert!(
            capacity.values <= u32::MAX as usize,
            "value capacity {} exceeds u32 offsets",
            capacity.values
        );
        let mut row_ptr = Vec::with_capacity(capacity.rows + 1);
        row_ptr.push(0);
        Self {
            capacity,
            row_index: Vec::with_capacity(capacity.values),
            col_index: Vec::with_capacity(capacity.values),
            values: Vec::with_capacity(capacity.values),
            row_ptr,
            scratch: Vec::new(),
        }
    }

    /// Capacity the store was allocated with.
    pub fn capacity(&self) -> StoreCapacity {
        self.capacity
    }

    /// Append one user's `(item, rating)` nonzeros as a row.
    ///
    /// # Panics
    ///
    /// Panics if `items` is empty or the row exceeds the allocated capacity.
    pub fn push_row(&mut self, user: u32, items: &[(u32, f32)]) {
        assert!(!items.is_empty(), "tuple row for user {} has no items", user);
        assert!(
            self.num_rows() < self.capacity.rows,
            "tuple store row capacity {} exceeded",
            self.capacity.rows
        );
        assert!(
            self.values.len() + items.len() <= self.capacity.values,
            "tuple store value capacity {} exceeded (have {}, appending {})",
            self.capacity.values,
            self.values.len(),
            items.len()
        );

        for &(item, rating) in items {
            self.row_index.push(user);
            self.col_index.push(item);
            self.values.push(rating);
        }
        self.row_ptr.push(self.values.len() as u32);
    }

    /// Release capacity beyond the ingested entries.
    ///
    /// Entries are neither moved nor reordered. No further rows can be pushed
    /// after shrinking.
    pub fn shrink_to_fit(&mut self) {
        self.row_index.shrink_to_fit();
        self.col_index.shrink_to_fit();
        self.values.shrink_to_fit();
        self.row_ptr.shrink_to_fit();
        self.scratch = Vec::new();
        self.capacity = StoreCapacity::new(self.num_rows(), self.values.len());
    }

    /// User id of each nonzero.
    pub fn row_indices(&self) -> &[u32] {
        &self.row_index
    }

    /// Item id of each nonzero.
    pub fn col_indices(&self) -> &[u32] {
        &self.col_index
    }

    /// Rating of each nonzero.
    pub fn ratings(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    fn bounds(&self, row: usize) -> (usize, usize) {
        assert!(
            row < self.num_rows(),
            "row {} out of bounds for store of {} rows",
            row,
            self.num_rows()
        );
        (self.row_ptr[row] as usize, self.row_ptr[row + 1] as usize)
    }
}

impl BackingStore for TupleStore {
    fn layout(&self) -> Layout {
        Layout::FlatCoo
    }

    fn num_rows(&self) -> usize {
        self.row_ptr.len() - 1
    }

    fn num_values(&self) -> usize {
        self.values.len()
    }

    fn label(&self, row: usize) -> f32 {
        self.bounds(row);
        0.0
    }

    #[inline]
    fn segment(&self, row: usize, group: FeatureGroup) -> Segment<'_> {
        let (start, end) = self.bounds(row);
        match group {
            FeatureGroup::Global => Segment::empty(),
            FeatureGroup::User => Segment {
                indices: RefVector::ints(&self.row_index, start, 1),
                values: RefVector::empty(),
            },
            FeatureGroup::Item => Segment {
                indices: RefVector::ints(&self.col_index, start, end - start),
                values: RefVector::floats(&self.values, start, end - start),
            },
        }
    }
}

impl Ingest for TupleStore {
    fn ingest(&mut self, line: &str) -> Result<(), ParseError> {
        let mut tokens = Tokens::new(line);
        // Label and counts are positional only; the pairs define the row.
        parse::parse_header(&mut tokens)?;

        let mut pairs = std::mem::take(&mut self.scratch);
        let result = parse::parse_pairs(&mut tokens, &mut pairs).and_then(|()| match pairs.split_first() {
            None => Err(ParseError::MissingUserPair),
            Some((&(user, _), [])) => Err(ParseError::MissingItemPairs { user }),
            Some((&(user, _), items)) => {
                self.push_row(user, items);
                Ok(())
            }
        });
        self.scratch = pairs;
        result
    }
}
