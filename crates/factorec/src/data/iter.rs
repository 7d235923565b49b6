//! Restartable cursor over a backing store, with optional id masking.

use super::record::FeatureRecord;
use super::storage::{BackingStore, FeatureGroup, GroupCounts};

// ============================================================================
// Masking
// ============================================================================

/// How user and item accessibility combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskMode {
    /// A pair is visible only if both its user and its item are accessible.
    Join,
    /// A pair is visible if its user or its item is accessible.
    Union,
}

/// Per-id accessibility masks for users and items.
///
/// Masks are indexed by id; ids at or beyond a mask's length are treated as
/// inaccessible. A row without a user index counts as user-accessible under
/// [`MaskMode::Join`] and contributes nothing under [`MaskMode::Union`].
#[derive(Clone, Copy, Debug)]
pub struct GroupMask<'a> {
    users: &'a [bool],
    items: &'a [bool],
    mode: MaskMode,
}

impl<'a> GroupMask<'a> {
    pub fn new(users: &'a [bool], items: &'a [bool], mode: MaskMode) -> Self {
        Self { users, items, mode }
    }

    pub fn join(users: &'a [bool], items: &'a [bool]) -> Self {
        Self::new(users, items, MaskMode::Join)
    }

    pub fn union(users: &'a [bool], items: &'a [bool]) -> Self {
        Self::new(users, items, MaskMode::Union)
    }

    #[inline]
    pub fn mode(&self) -> MaskMode {
        self.mode
    }

    #[inline]
    fn user_ok(&self, user: u32) -> bool {
        self.users.get(user as usize).copied().unwrap_or(false)
    }

    #[inline]
    fn item_ok(&self, item: u32) -> bool {
        self.items.get(item as usize).copied().unwrap_or(false)
    }

    /// Whether the row's user side passes on its own.
    #[inline]
    fn user_passes(&self, user: Option<u32>) -> bool {
        match (self.mode, user) {
            (MaskMode::Join, None) => true,
            (MaskMode::Union, None) => false,
            (_, Some(u)) => self.user_ok(u),
        }
    }

    /// Whether the `(user, item)` pair is visible.
    #[inline]
    pub fn keeps(&self, user: Option<u32>, item: u32) -> bool {
        match self.mode {
            MaskMode::Join => self.user_passes(user) && self.item_ok(item),
            MaskMode::Union => self.user_passes(user) || self.item_ok(item),
        }
    }

    /// Visible item count of `row`, or `None` if the row is hidden.
    fn visible_items(&self, store: &dyn BackingStore, row: usize) -> Option<usize> {
        let users = store.segment(row, FeatureGroup::User).indices;
        let user = (!users.is_empty()).then(|| users.int_value(0));
        let items = store.segment(row, FeatureGroup::Item).indices;

        if items.is_empty() {
            return self.user_passes(user).then_some(0);
        }
        let kept = items.iter_ints().filter(|&item| self.keeps(user, item)).count();
        (kept > 0).then_some(kept)
    }
}

// ============================================================================
// DatasetIter
// ============================================================================

/// Cursor over the rows of a [`BackingStore`].
///
/// The iterator owns one [`FeatureRecord`] and repoints it on each
/// [`advance`](Self::advance); [`refresh`](Self::refresh) rewinds for the next
/// pass without touching any buffer. Several iterators may share one store.
///
/// ```
/// use factorec::data::{DatasetIter, GroupedStore, Ingest, StoreCapacity};
///
/// let mut store = GroupedStore::new(StoreCapacity::new(2, 4));
/// store.ingest("1 0 1 1 0:1 3:4.0").unwrap();
/// store.ingest("2 0 1 1 1:1 4:2.0").unwrap();
///
/// let mut iter = DatasetIter::new(&store);
/// let mut labels = Vec::new();
/// while iter.has_next() {
///     labels.push(iter.advance().label());
/// }
/// assert_eq!(labels, vec![1.0, 2.0]);
/// ```
#[derive(Debug)]
pub struct DatasetIter<'a> {
    store: &'a dyn BackingStore,
    mask: Option<GroupMask<'a>>,
    /// Rows that survive the mask; `None` when unmasked.
    visible: Option<Vec<u32>>,
    cursor: usize,
    counts: GroupCounts,
    record: FeatureRecord<'a>,
}

impl<'a> DatasetIter<'a> {
    /// Iterate every row of `store`.
    pub fn new(store: &'a dyn BackingStore) -> Self {
        let mut counts = GroupCounts::default();
        for row in 0..store.num_rows() {
            counts += store.counts(row);
        }
        Self {
            store,
            mask: None,
            visible: None,
            cursor: 0,
            counts,
            record: FeatureRecord::empty(),
        }
    }

    /// Iterate only the rows and item pairs that pass `mask`.
    pub fn masked(store: &'a dyn BackingStore, mask: GroupMask<'a>) -> Self {
        let mut counts = GroupCounts::default();
        let mut visible = Vec::new();
        for row in 0..store.num_rows() {
            if let Some(items) = mask.visible_items(store, row) {
                let stored = store.counts(row);
                counts += GroupCounts { item: items, ..stored };
                visible.push(row as u32);
            }
        }
        Self {
            store,
            mask: Some(mask),
            visible: Some(visible),
            cursor: 0,
            counts,
            record: FeatureRecord::empty(),
        }
    }

    /// The store being iterated.
    pub fn store(&self) -> &'a dyn BackingStore {
        self.store
    }

    /// Mask applied to this iterator, if any.
    pub fn mask(&self) -> Option<GroupMask<'a>> {
        self.mask
    }

    /// Number of rows one pass yields.
    #[inline]
    pub fn num_rows(&self) -> usize {
        match &self.visible {
            Some(rows) => rows.len(),
            None => self.store.num_rows(),
        }
    }

    /// Total visible pair counts over one pass.
    #[inline]
    pub fn aggregate_counts(&self) -> GroupCounts {
        self.counts
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.cursor < self.num_rows()
    }

    /// Move to the next row and return the repointed record.
    ///
    /// # Panics
    ///
    /// Panics if [`has_next`](Self::has_next) is false.
    #[inline]
    pub fn advance(&mut self) -> &FeatureRecord<'a> {
        assert!(
            self.has_next(),
            "advance past the end of a {}-row pass",
            self.num_rows()
        );
        let row = match &self.visible {
            Some(rows) => rows[self.cursor] as usize,
            None => self.cursor,
        };
        self.cursor += 1;

        self.record.repoint(self.store, row);
        if let Some(mask) = self.mask {
            let user = self.record.user_id();
            self.record.project_items(|item| mask.keeps(user, item));
        }
        &self.record
    }

    /// Rewind to the first row.
    #[inline]
    pub fn refresh(&mut self) {
        self.cursor = 0;
    }

    /// Lending-style step: `Some(record)` until the pass is exhausted.
    #[inline]
    pub fn next_record(&mut self) -> Option<&FeatureRecord<'a>> {
        if self.has_next() {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Rewind and run `f` on every row of one full pass.
    pub fn for_each_record<F: FnMut(&FeatureRecord<'a>)>(&mut self, mut f: F) {
        self.refresh();
        while let Some(record) = self.next_record() {
            f(record);
        }
    }
}
