//! The per-row cursor handed out by [`DatasetIter`](super::DatasetIter).

use super::refvec::{PrjRefVector, RefVector};
use super::storage::{BackingStore, FeatureGroup, GroupCounts, Segment};

/// One training row, repointed in place on every iterator step.
///
/// All views borrow the backing store (`'a`) and, for the masked item
/// group, the record's own projection buffer. The borrow checker ties every
/// accessor result to `&self`, so a view cannot outlive the next
/// [`advance`](super::DatasetIter::advance). Use [`to_owned_row`](Self::to_owned_row)
/// to keep a row.
#[derive(Debug)]
pub struct FeatureRecord<'a> {
    row: usize,
    label: f32,
    counts: GroupCounts,
    segments: [Segment<'a>; 3],
    item_projection: Vec<u32>,
    projected: bool,
}

impl<'a> FeatureRecord<'a> {
    pub(crate) fn empty() -> Self {
        Self {
            row: 0,
            label: 0.0,
            counts: GroupCounts::default(),
            segments: [Segment::empty(); 3],
            item_projection: Vec::new(),
            projected: false,
        }
    }

    /// Point the record at `row` of `store`, dropping any projection.
    #[inline]
    pub(crate) fn repoint(&mut self, store: &'a dyn BackingStore, row: usize) {
        self.row = row;
        self.label = store.label(row);
        for group in FeatureGroup::ALL {
            self.segments[group.position()] = store.segment(row, group);
        }
        self.counts = GroupCounts {
            global: self.segments[0].len(),
            user: self.segments[1].len(),
            item: self.segments[2].len(),
        };
        self.projected = false;
    }

    /// Restrict the item group to the pairs whose item id passes `keep`.
    ///
    /// The projection buffer is reused; it only grows to the longest item
    /// segment seen.
    #[inline]
    pub(crate) fn project_items<F: Fn(u32) -> bool>(&mut self, keep: F) {
        self.item_projection.clear();
        let items = self.segments[FeatureGroup::Item.position()].indices;
        for (pos, item) in items.iter_ints().enumerate() {
            if keep(item) {
                self.item_projection.push(pos as u32);
            }
        }
        self.projected = true;
        self.counts.item = self.item_projection.len();
    }

    /// Row number inside the backing store.
    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn label(&self) -> f32 {
        self.label
    }

    /// Visible pair counts per group.
    #[inline]
    pub fn counts(&self) -> GroupCounts {
        self.counts
    }

    #[inline]
    pub fn num_global(&self) -> usize {
        self.counts.global
    }

    #[inline]
    pub fn num_ufactor(&self) -> usize {
        self.counts.user
    }

    #[inline]
    pub fn num_ifactor(&self) -> usize {
        self.counts.item
    }

    #[inline]
    fn projection(&self, group: FeatureGroup) -> Option<&[u32]> {
        match group {
            FeatureGroup::Item if self.projected => Some(&self.item_projection),
            _ => None,
        }
    }

    /// Feature indices of `group`, through the mask projection if any.
    #[inline]
    pub fn indices(&self, group: FeatureGroup) -> PrjRefVector<'_> {
        PrjRefVector::new(self.segments[group.position()].indices, self.projection(group))
    }

    /// Feature values of `group`, through the mask projection if any.
    ///
    /// Groups without stored values (the user group of a flat-COO row) yield
    /// an empty view.
    #[inline]
    pub fn values(&self, group: FeatureGroup) -> PrjRefVector<'_> {
        let base = self.segments[group.position()].values;
        if base.is_empty() {
            return PrjRefVector::direct(RefVector::empty());
        }
        PrjRefVector::new(base, self.projection(group))
    }

    /// Unprojected stored segment of `group`.
    #[inline]
    pub fn raw_segment(&self, group: FeatureGroup) -> Segment<'a> {
        self.segments[group.position()]
    }

    /// The row's user id: the first user-group index, if any.
    #[inline]
    pub fn user_id(&self) -> Option<u32> {
        let users = self.segments[FeatureGroup::User.position()].indices;
        (!users.is_empty()).then(|| users.int_value(0))
    }

    /// Visible `(item, value)` pairs.
    pub fn items(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        let indices = self.indices(FeatureGroup::Item);
        let values = self.values(FeatureGroup::Item);
        (0..indices.len()).map(move |i| (indices.int_value(i), values.float_value(i)))
    }

    /// Copy the visible contents out of the store.
    pub fn to_owned_row(&self) -> OwnedRow {
        let group = |g: FeatureGroup| OwnedGroup {
            indices: self.indices(g).iter_ints().collect(),
            values: self.values(g).iter_floats().collect(),
        };
        OwnedRow {
            row: self.row,
            label: self.label,
            global: group(FeatureGroup::Global),
            user: group(FeatureGroup::User),
            item: group(FeatureGroup::Item),
        }
    }
}

/// Owned copy of one group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OwnedGroup {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

/// Owned copy of a [`FeatureRecord`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OwnedRow {
    pub row: usize,
    pub label: f32,
    pub global: OwnedGroup,
    pub user: OwnedGroup,
    pub item: OwnedGroup,
}

impl OwnedRow {
    /// Pair counts of the copied groups.
    pub fn counts(&self) -> GroupCounts {
        GroupCounts {
            global: self.global.indices.len(),
            user: self.user.indices.len(),
            item: self.item.indices.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::storage::{GroupedStore, StoreCapacity};

    fn store() -> GroupedStore {
        let mut store = GroupedStore::new(StoreCapacity::new(1, 4));
        store.push_row(4.5, [&[(0, 1.0)], &[(7, 1.0)], &[(10, 2.0), (11, 3.0)]]);
        store
    }

    #[test]
    fn repoint_exposes_all_groups() {
        let store = store();
        let mut record = FeatureRecord::empty();
        record.repoint(&store, 0);

        assert_eq!(record.label(), 4.5);
        assert_eq!(record.counts(), GroupCounts { global: 1, user: 1, item: 2 });
        assert_eq!(record.user_id(), Some(7));
        assert_eq!(record.items().collect::<Vec<_>>(), vec![(10, 2.0), (11, 3.0)]);
    }

    #[test]
    fn projection_hides_items_until_repoint() {
        let store = store();
        let mut record = FeatureRecord::empty();
        record.repoint(&store, 0);
        record.project_items(|item| item == 11);

        assert_eq!(record.num_ifactor(), 1);
        assert_eq!(record.items().collect::<Vec<_>>(), vec![(11, 3.0)]);
        assert_eq!(record.raw_segment(FeatureGroup::Item).len(), 2);

        record.repoint(&store, 0);
        assert_eq!(record.num_ifactor(), 2);
    }

    #[test]
    fn owned_row_survives_store_borrow() {
        let owned = {
            let store = store();
            let mut record = FeatureRecord::empty();
            record.repoint(&store, 0);
            record.to_owned_row()
        };
        assert_eq!(owned.counts(), GroupCounts { global: 1, user: 1, item: 2 });
        assert_eq!(owned.item.indices, vec![10, 11]);
        assert_eq!(owned.item.values, vec![2.0, 3.0]);
    }
}
