//! Grouped-CSR store: three segments per row in shared index/value arrays.

use crate::data::parse::{self, ParseError, Tokens};
use crate::data::quantize::QuantDict;
use crate::data::refvec::{RefDataMut, RefVector, RefVectorMut};

use super::{BackingStore, FeatureGroup, Ingest, Layout, Segment, StoreCapacity};

/// Value array of a grouped store.
#[derive(Clone, Debug)]
enum ValueArray {
    Floats(Vec<f32>),
    Codes { codes: Vec<u16>, dict: QuantDict },
}

impl ValueArray {
    fn len(&self) -> usize {
        match self {
            ValueArray::Floats(v) => v.len(),
            ValueArray::Codes { codes, .. } => codes.len(),
        }
    }

    #[inline]
    fn push(&mut self, value: f32) {
        match self {
            ValueArray::Floats(v) => v.push(value),
            ValueArray::Codes { codes, dict } => codes.push(dict.encode(value)),
        }
    }

    fn view(&self, offset: usize, len: usize) -> RefVector<'_> {
        match self {
            ValueArray::Floats(v) => RefVector::floats(v, offset, len),
            ValueArray::Codes { codes, dict } => RefVector::codes(codes, dict, offset, len),
        }
    }
}

/// Grouped-CSR backing store.
///
/// For row `r`, `row_ptr[3r]`, `row_ptr[3r + 1]` and `row_ptr[3r + 2]` are the
/// start offsets of its global, user and item segments inside `feat_index`
/// and the value array; `row_ptr[3r + 3]` closes the item segment.
///
/// # Example
///
/// ```
/// use factorec::data::{BackingStore, FeatureGroup, GroupedStore, Ingest, StoreCapacity};
///
/// let mut store = GroupedStore::new(StoreCapacity::new(1, 3));
/// store.ingest("4.5 0 1 2 7:1.0 10:2.0 11:3.0").unwrap();
///
/// let items = store.segment(0, FeatureGroup::Item);
/// assert_eq!(items.indices.int_value(1), 11);
/// assert_eq!(items.values.float_value(1), 3.0);
/// ```
#[derive(Clone, Debug)]
pub struct GroupedStore {
    capacity: StoreCapacity,
    row_label: Vec<f32>,
    row_ptr: Vec<u32>,
    feat_index: Vec<u32>,
    values: ValueArray,
    /// Line scratch, reused across `ingest` calls.
    scratch: Vec<(u32, f32)>,
}

impl GroupedStore {
    /// Allocate a float-valued store with final capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity.values` does not fit in a `u32` offset.
    pub fn new(capacity: StoreCapacity) -> Self {
        Self::with_values(capacity, ValueArray::Floats(Vec::with_capacity(capacity.values)))
    }

    /// Allocate a store whose values are stored as codes of `dict`.
    ///
    /// The dictionary may be empty or pre-seeded; new values allocate codes
    /// as they are ingested.
    pub fn quantized(capacity: StoreCapacity, dict: QuantDict) -> Self {
        Self::with_values(
            capacity,
            ValueArray::Codes {
                codes: Vec::with_capacity(capacity.values),
                dict,
            },
        )
    }

    fn with_values(capacity: StoreCapacity, values: ValueArray) -> Self {
        assert!(
            capacity.values <= u32::MAX as usize,
            "value capacity {} exceeds u32 offsets",
            capacity.values
        );
        let mut row_ptr = Vec::with_capacity(3 * capacity.rows + 1);
        row_ptr.push(0);
        Self {
            capacity,
            row_label: Vec::with_capacity(capacity.rows),
            row_ptr,
            feat_index: Vec::with_capacity(capacity.values),
            values,
            scratch: Vec::new(),
        }
    }

    /// Capacity the store was allocated with.
    pub fn capacity(&self) -> StoreCapacity {
        self.capacity
    }

    /// Quantization dictionary, if values are stored as codes.
    pub fn dict(&self) -> Option<&QuantDict> {
        match &self.values {
            ValueArray::Floats(_) => None,
            ValueArray::Codes { dict, .. } => Some(dict),
        }
    }

    /// Returns true if values are stored as codes.
    pub fn is_quantized(&self) -> bool {
        self.dict().is_some()
    }

    /// Append a row from its three groups of `(index, value)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if the row or its pairs exceed the allocated capacity.
    pub fn push_row(&mut self, label: f32, groups: [&[(u32, f32)]; 3]) {
        let n_pairs: usize = groups.iter().map(|g| g.len()).sum();
        assert!(
            self.row_label.len() < self.capacity.rows,
            "grouped store row capacity {} exceeded",
            self.capacity.rows
        );
        assert!(
            self.feat_index.len() + n_pairs <= self.capacity.values,
            "grouped store value capacity {} exceeded (have {}, appending {})",
            self.capacity.values,
            self.feat_index.len(),
            n_pairs
        );

        self.row_label.push(label);
        for group in groups {
            for &(index, value) in group {
                self.feat_index.push(index);
                self.values.push(value);
            }
            self.row_ptr.push(self.feat_index.len() as u32);
        }
    }

    /// Overwrite the label of `row`.
    pub fn set_label(&mut self, row: usize, label: f32) {
        self.row_label[row] = label;
    }

    /// Mutable view over the values of one group of `row`.
    pub fn values_mut(&mut self, row: usize, group: FeatureGroup) -> RefVectorMut<'_> {
        let (start, end) = self.bounds(row, group);
        let data = match &mut self.values {
            ValueArray::Floats(v) => RefDataMut::Floats(v),
            ValueArray::Codes { codes, dict } => RefDataMut::Codes { codes, dict },
        };
        RefVectorMut::new(data, start, end - start)
    }

    #[inline]
    fn bounds(&self, row: usize, group: FeatureGroup) -> (usize, usize) {
        assert!(
            row < self.row_label.len(),
            "row {} out of bounds for store of {} rows",
            row,
            self.row_label.len()
        );
        let slot = 3 * row + group.position();
        (self.row_ptr[slot] as usize, self.row_ptr[slot + 1] as usize)
    }
}

impl BackingStore for GroupedStore {
    fn layout(&self) -> Layout {
        Layout::GroupedCsr
    }

    fn num_rows(&self) -> usize {
        self.row_label.len()
    }

    fn num_values(&self) -> usize {
        self.feat_index.len()
    }

    fn label(&self, row: usize) -> f32 {
        self.row_label[row]
    }

    #[inline]
    fn segment(&self, row: usize, group: FeatureGroup) -> Segment<'_> {
        let (start, end) = self.bounds(row, group);
        Segment {
            indices: RefVector::ints(&self.feat_index, start, end - start),
            values: self.values.view(start, end - start),
        }
    }
}

impl Ingest for GroupedStore {
    fn ingest(&mut self, line: &str) -> Result<(), ParseError> {
        let mut tokens = Tokens::new(line);
        let header = parse::parse_header(&mut tokens)?;
        let label = parse::parse_label(header.label)?;

        let mut pairs = std::mem::take(&mut self.scratch);
        let parsed = parse::parse_pairs(&mut tokens, &mut pairs);
        let result = parsed.and_then(|()| {
            let declared = header.counts.total();
            if pairs.len() != declared {
                return Err(ParseError::PairCountMismatch {
                    declared,
                    found: pairs.len(),
                });
            }
            let (global, rest) = pairs.split_at(header.counts.global);
            let (user, item) = rest.split_at(header.counts.user);
            self.push_row(label, [global, user, item]);
            Ok(())
        });
        self.scratch = pairs;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingest_all(store: &mut GroupedStore, lines: &[&str]) {
        for line in lines {
            store.ingest(line).unwrap();
        }
    }

    #[test]
    fn ingest_records_segment_boundaries() {
        let mut store = GroupedStore::new(StoreCapacity::new(2, 6));
        ingest_all(&mut store, &["4.5 0 1 2 7:1.0 10:2.0 11:3.0", "1 1 1 1 0:1 3:1 5:2.5"]);

        assert_eq!(store.num_rows(), 2);
        assert_eq!(store.num_values(), 6);
        assert_eq!(store.row_ptr, vec![0, 0, 1, 3, 4, 5, 6]);

        let user = store.segment(0, FeatureGroup::User);
        assert_eq!(user.indices.int_value(0), 7);
        assert_eq!(user.values.float_value(0), 1.0);

        let global = store.segment(1, FeatureGroup::Global);
        assert_eq!(global.len(), 1);
        assert_eq!(store.label(1), 1.0);
        assert_eq!(store.segment(1, FeatureGroup::Item).values.float_value(0), 2.5);
    }

    #[test]
    fn rejected_line_leaves_store_untouched() {
        let mut store = GroupedStore::new(StoreCapacity::new(2, 4));
        store.ingest("2.0 0 1 1 1:1.0 2:1.0").unwrap();

        let err = store.ingest("3.0 0 1 2 1:1.0 2:1.0").unwrap_err();
        assert_eq!(err, ParseError::PairCountMismatch { declared: 3, found: 2 });
        let err = store.ingest("3.0 0 1 1 1:1.0 x:1.0").unwrap_err();
        assert!(matches!(err, ParseError::InvalidToken { what: "feature index", .. }));
        let err = store.ingest("abc 0 0 1 1:1.0").unwrap_err();
        assert!(matches!(err, ParseError::InvalidToken { what: "label", .. }));

        assert_eq!(store.num_rows(), 1);
        assert_eq!(store.num_values(), 2);
        assert_eq!(store.row_ptr.len(), 4);
    }

    #[test]
    fn quantized_store_decodes_values() {
        let dict = QuantDict::with_values([1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut store = GroupedStore::quantized(StoreCapacity::new(1, 3), dict);
        store.ingest("4 0 1 2 7:1 10:4.5 11:3").unwrap();

        let items = store.segment(0, FeatureGroup::Item);
        assert_eq!(items.values.float_value(0), 4.5);
        assert_eq!(items.values.float_value(1), 3.0);
        assert_eq!(store.dict().map(QuantDict::len), Some(6));
    }

    #[test]
    #[should_panic(expected = "value capacity")]
    fn value_capacity_overflow_panics() {
        let mut store = GroupedStore::new(StoreCapacity::new(2, 2));
        let _ = store.ingest("1 0 1 2 1:1 2:1 3:1");
    }

    #[test]
    #[should_panic(expected = "row capacity")]
    fn row_capacity_overflow_panics() {
        let mut store = GroupedStore::new(StoreCapacity::new(1, 10));
        store.push_row(1.0, [&[], &[(0, 1.0)], &[]]);
        store.push_row(1.0, [&[], &[(0, 1.0)], &[]]);
    }

    #[test]
    fn in_place_edits() {
        let mut store = GroupedStore::new(StoreCapacity::new(1, 2));
        store.push_row(3.0, [&[], &[(4, 1.0)], &[(9, 2.0)]]);

        store.set_label(0, -0.5);
        store.values_mut(0, FeatureGroup::Item).set(0, 0.25);

        assert_eq!(store.label(0), -0.5);
        assert_eq!(store.segment(0, FeatureGroup::Item).values.float_value(0), 0.25);
        assert_eq!(store.segment(0, FeatureGroup::User).values.float_value(0), 1.0);
    }
}
