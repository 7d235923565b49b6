//! Zero-copy typed views into a store's packed arrays.
//!
//! A view is `{backing, offset, length}`: it owns nothing and aliases one
//! of the store's arrays. Every access is bounds-checked against the
//! view's own length, never against the size of the backing array.
//!
//! The backing is a tagged union ([`RefData`]). Typed accessors dispatch on
//! the tag with an exhaustive `match`, so an integer read can never touch
//! the float array and vice versa.

use super::quantize::QuantDict;

// ============================================================================
// RefData
// ============================================================================

/// Kind of array a view is backed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefKind {
    /// Integer-backed (feature indices, ids).
    Ints,
    /// Float-backed (feature values, ratings).
    Floats,
    /// Quantized codes decoded through a [`QuantDict`].
    Codes,
}

/// Shared backing array of a view.
#[derive(Clone, Copy, Debug)]
pub enum RefData<'a> {
    Ints(&'a [u32]),
    Floats(&'a [f32]),
    Codes { codes: &'a [u16], dict: &'a QuantDict },
}

impl<'a> RefData<'a> {
    /// Tag of this backing.
    #[inline]
    pub fn kind(&self) -> RefKind {
        match self {
            RefData::Ints(_) => RefKind::Ints,
            RefData::Floats(_) => RefKind::Floats,
            RefData::Codes { .. } => RefKind::Codes,
        }
    }

    /// Physical length of the backing array.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            RefData::Ints(data) => data.len(),
            RefData::Floats(data) => data.len(),
            RefData::Codes { codes, .. } => codes.len(),
        }
    }

    /// Returns true if the backing array is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn int_at(&self, pos: usize) -> u32 {
        match self {
            RefData::Ints(data) => data[pos],
            RefData::Floats(data) => data[pos] as u32,
            RefData::Codes { codes, dict } => dict.decode(codes[pos]) as u32,
        }
    }

    #[inline]
    fn float_at(&self, pos: usize) -> f32 {
        match self {
            RefData::Ints(data) => data[pos] as f32,
            RefData::Floats(data) => data[pos],
            RefData::Codes { codes, dict } => dict.decode(codes[pos]),
        }
    }

    #[inline]
    fn number_at(&self, pos: usize) -> f64 {
        match self {
            RefData::Ints(data) => data[pos] as f64,
            RefData::Floats(data) => data[pos] as f64,
            RefData::Codes { codes, dict } => dict.decode(codes[pos]) as f64,
        }
    }
}

// ============================================================================
// RefVector
// ============================================================================

/// Bounds-checked view of `len` consecutive entries starting at `offset`.
#[derive(Clone, Copy, Debug)]
pub struct RefVector<'a> {
    data: RefData<'a>,
    offset: usize,
    len: usize,
}

impl<'a> RefVector<'a> {
    /// Create a view over `data[offset..offset + len]`.
    ///
    /// # Panics
    ///
    /// Panics if the window does not fit inside the backing array.
    #[inline]
    pub fn new(data: RefData<'a>, offset: usize, len: usize) -> Self {
        assert!(
            offset + len <= data.len(),
            "view [{}..{}) exceeds backing array of length {}",
            offset,
            offset + len,
            data.len()
        );
        Self { data, offset, len }
    }

    /// Integer-backed view.
    #[inline]
    pub fn ints(data: &'a [u32], offset: usize, len: usize) -> Self {
        Self::new(RefData::Ints(data), offset, len)
    }

    /// Float-backed view.
    #[inline]
    pub fn floats(data: &'a [f32], offset: usize, len: usize) -> Self {
        Self::new(RefData::Floats(data), offset, len)
    }

    /// Code-backed view decoded through `dict`.
    #[inline]
    pub fn codes(codes: &'a [u16], dict: &'a QuantDict, offset: usize, len: usize) -> Self {
        Self::new(RefData::Codes { codes, dict }, offset, len)
    }

    /// Zero-length view.
    #[inline]
    pub fn empty() -> Self {
        Self {
            data: RefData::Floats(&[]),
            offset: 0,
            len: 0,
        }
    }

    /// Number of visible entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the view has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the first entry inside the backing array.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Tag of the backing array.
    #[inline]
    pub fn kind(&self) -> RefKind {
        self.data.kind()
    }

    #[inline]
    fn check(&self, i: usize) {
        assert!(
            i < self.len,
            "index {} out of bounds for view of length {}",
            i,
            self.len
        );
    }

    /// Value at `i` as a generic number.
    ///
    /// # Panics
    ///
    /// Panics unless `i < self.len()`.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.check(i);
        self.data.number_at(self.offset + i)
    }

    /// Value at `i` read as an integer. Float backings truncate toward zero.
    #[inline]
    pub fn int_value(&self, i: usize) -> u32 {
        self.check(i);
        self.data.int_at(self.offset + i)
    }

    /// Value at `i` read as a float.
    #[inline]
    pub fn float_value(&self, i: usize) -> f32 {
        self.check(i);
        self.data.float_at(self.offset + i)
    }

    /// Iterate the entries as integers.
    pub fn iter_ints(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        (0..self.len).map(move |i| self.data.int_at(self.offset + i))
    }

    /// Iterate the entries as floats.
    pub fn iter_floats(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        (0..self.len).map(move |i| self.data.float_at(self.offset + i))
    }

    /// Sum of products with another view of the same length.
    pub fn dot(&self, other: &RefVector<'_>) -> f64 {
        assert_eq!(self.len, other.len, "dot product of views with different lengths");
        (0..self.len)
            .map(|i| self.data.number_at(self.offset + i) * other.data.number_at(other.offset + i))
            .sum()
    }
}

// ============================================================================
// PrjRefVector
// ============================================================================

/// A [`RefVector`] read through an optional indirection table.
///
/// With a projection attached, local index `i` resolves to the base view's
/// position `projection[i]` and the visible length is the projection's
/// length. Without one, indices pass through unchanged.
#[derive(Clone, Copy, Debug)]
pub struct PrjRefVector<'a> {
    base: RefVector<'a>,
    projection: Option<&'a [u32]>,
}

impl<'a> PrjRefVector<'a> {
    /// Wrap `base`, optionally projected through `projection`.
    #[inline]
    pub fn new(base: RefVector<'a>, projection: Option<&'a [u32]>) -> Self {
        Self { base, projection }
    }

    /// Unprojected pass-through view.
    #[inline]
    pub fn direct(base: RefVector<'a>) -> Self {
        Self::new(base, None)
    }

    /// Number of visible entries.
    #[inline]
    pub fn len(&self) -> usize {
        match self.projection {
            Some(prj) => prj.len(),
            None => self.base.len(),
        }
    }

    /// Returns true if no entries are visible.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying unprojected view.
    #[inline]
    pub fn base(&self) -> RefVector<'a> {
        self.base
    }

    /// The attached projection, if any.
    #[inline]
    pub fn projection(&self) -> Option<&'a [u32]> {
        self.projection
    }

    /// Tag of the backing array.
    #[inline]
    pub fn kind(&self) -> RefKind {
        self.base.kind()
    }

    #[inline]
    fn resolve(&self, i: usize) -> usize {
        match self.projection {
            Some(prj) => {
                assert!(
                    i < prj.len(),
                    "index {} out of bounds for projected view of length {}",
                    i,
                    prj.len()
                );
                prj[i] as usize
            }
            None => i,
        }
    }

    /// Value at `i` as a generic number.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.base.get(self.resolve(i))
    }

    /// Value at `i` read as an integer.
    #[inline]
    pub fn int_value(&self, i: usize) -> u32 {
        self.base.int_value(self.resolve(i))
    }

    /// Value at `i` read as a float.
    #[inline]
    pub fn float_value(&self, i: usize) -> f32 {
        self.base.float_value(self.resolve(i))
    }

    /// Iterate the visible entries as integers.
    pub fn iter_ints(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(move |i| self.int_value(i))
    }

    /// Iterate the visible entries as floats.
    pub fn iter_floats(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.len()).map(move |i| self.float_value(i))
    }
}

// ============================================================================
// RefVectorMut
// ============================================================================

/// Exclusive backing array of a mutable view.
#[derive(Debug)]
pub enum RefDataMut<'a> {
    Ints(&'a mut [u32]),
    Floats(&'a mut [f32]),
    Codes {
        codes: &'a mut [u16],
        dict: &'a mut QuantDict,
    },
}

/// Mutable counterpart of [`RefVector`], only obtainable while the owning
/// store is exclusively borrowed.
#[derive(Debug)]
pub struct RefVectorMut<'a> {
    data: RefDataMut<'a>,
    offset: usize,
    len: usize,
}

impl<'a> RefVectorMut<'a> {
    /// Create a mutable view over `data[offset..offset + len]`.
    pub fn new(data: RefDataMut<'a>, offset: usize, len: usize) -> Self {
        let backing_len = match &data {
            RefDataMut::Ints(d) => d.len(),
            RefDataMut::Floats(d) => d.len(),
            RefDataMut::Codes { codes, .. } => codes.len(),
        };
        assert!(
            offset + len <= backing_len,
            "view [{}..{}) exceeds backing array of length {}",
            offset,
            offset + len,
            backing_len
        );
        Self { data, offset, len }
    }

    /// Number of visible entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the view has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Tag of the backing array.
    #[inline]
    pub fn kind(&self) -> RefKind {
        match self.data {
            RefDataMut::Ints(_) => RefKind::Ints,
            RefDataMut::Floats(_) => RefKind::Floats,
            RefDataMut::Codes { .. } => RefKind::Codes,
        }
    }

    /// Value at `i` as a generic number.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        assert!(i < self.len, "index {} out of bounds for view of length {}", i, self.len);
        let pos = self.offset + i;
        match &self.data {
            RefDataMut::Ints(d) => d[pos] as f64,
            RefDataMut::Floats(d) => d[pos] as f64,
            RefDataMut::Codes { codes, dict } => dict.decode(codes[pos]) as f64,
        }
    }

    /// Overwrite the entry at `i`.
    ///
    /// Integer backings truncate toward zero (negative values saturate at 0);
    /// code backings encode the value, allocating a new code if needed.
    #[inline]
    pub fn set(&mut self, i: usize, value: f64) {
        assert!(i < self.len, "index {} out of bounds for view of length {}", i, self.len);
        let pos = self.offset + i;
        match &mut self.data {
            RefDataMut::Ints(d) => d[pos] = value as u32,
            RefDataMut::Floats(d) => d[pos] = value as f32,
            RefDataMut::Codes { codes, dict } => codes[pos] = dict.encode(value as f32),
        }
    }

    /// Immutable view of the same window.
    pub fn as_view(&self) -> RefVector<'_> {
        let data = match &self.data {
            RefDataMut::Ints(d) => RefData::Ints(d),
            RefDataMut::Floats(d) => RefData::Floats(d),
            RefDataMut::Codes { codes, dict } => RefData::Codes { codes, dict },
        };
        RefVector::new(data, self.offset, self.len)
    }

    /// Address this view through `projection`.
    pub fn project(self, projection: &'a [u32]) -> PrjRefVectorMut<'a> {
        PrjRefVectorMut::new(self, Some(projection))
    }
}

// ============================================================================
// PrjRefVectorMut
// ============================================================================

/// A [`RefVectorMut`] written through an optional indirection table.
///
/// Local index `i` resolves to `projection[i]` and is bounds-checked against
/// the projection's length; the resolved position is then checked against
/// the base view.
#[derive(Debug)]
pub struct PrjRefVectorMut<'a> {
    base: RefVectorMut<'a>,
    projection: Option<&'a [u32]>,
}

impl<'a> PrjRefVectorMut<'a> {
    pub fn new(base: RefVectorMut<'a>, projection: Option<&'a [u32]>) -> Self {
        Self { base, projection }
    }

    /// Number of visible entries.
    #[inline]
    pub fn len(&self) -> usize {
        match self.projection {
            Some(prj) => prj.len(),
            None => self.base.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn kind(&self) -> RefKind {
        self.base.kind()
    }

    #[inline]
    fn resolve(&self, i: usize) -> usize {
        match self.projection {
            Some(prj) => {
                assert!(
                    i < prj.len(),
                    "index {} out of bounds for projected view of length {}",
                    i,
                    prj.len()
                );
                prj[i] as usize
            }
            None => i,
        }
    }

    /// # Panics
    ///
    /// Panics unless `i < self.len()`.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.base.get(self.resolve(i))
    }

    /// Overwrite the entry at local index `i`.
    ///
    /// # Panics
    ///
    /// Panics unless `i < self.len()`.
    #[inline]
    pub fn set(&mut self, i: usize, value: f64) {
        let pos = self.resolve(i);
        self.base.set(pos, value);
    }

    /// Immutable view of the same window and projection.
    pub fn as_view(&self) -> PrjRefVector<'_> {
        PrjRefVector::new(self.base.as_view(), self.projection)
    }
}
