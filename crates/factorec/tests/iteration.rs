//! Iterator passes, masking and view bounds.

use proptest::prelude::*;
use rstest::rstest;

use factorec::data::{
    BackingStore, DatasetIter, FeatureGroup, GroupMask, GroupedStore, MaskMode, OwnedRow,
    PrjRefVector, PrjRefVectorMut, QuantDict, RefDataMut, RefVector, RefVectorMut, StoreCapacity,
    TupleStore,
};
use factorec::testing::{grouped_store, synthetic_ratings, tuple_store};

fn one_pass(iter: &mut DatasetIter<'_>) -> Vec<OwnedRow> {
    let mut rows = Vec::new();
    while iter.has_next() {
        rows.push(iter.advance().to_owned_row());
    }
    rows
}

// =============================================================================
// Restartability
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn refresh_repeats_the_pass(
        n_users in 0usize..20,
        n_items in 1usize..15,
        per_user in 1usize..6,
        seed in any::<u64>(),
        quantize in any::<bool>(),
    ) {
        let rows = synthetic_ratings(n_users, n_items, per_user, 2, seed, 0.5);
        let grouped = grouped_store(&rows, quantize);
        let tuples = tuple_store(&rows);

        for store in [&grouped as &dyn BackingStore, &tuples] {
            let mut iter = DatasetIter::new(store);
            let first = one_pass(&mut iter);
            prop_assert!(!iter.has_next());
            iter.refresh();
            let second = one_pass(&mut iter);
            prop_assert_eq!(first.len(), store.num_rows());
            prop_assert_eq!(first, second);
        }
    }
}

#[test]
fn concurrent_iterators_share_a_store() {
    let rows = synthetic_ratings(50, 20, 5, 3, 3, 0.2);
    let store = grouped_store(&rows, false);
    let expected = one_pass(&mut DatasetIter::new(&store));

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| one_pass(&mut DatasetIter::new(&store))))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn aggregate_counts_sum_every_row() {
    let rows = synthetic_ratings(10, 8, 4, 2, 5, 0.0);
    let store = grouped_store(&rows, false);
    let counts = DatasetIter::new(&store).aggregate_counts();
    assert_eq!((counts.global, counts.user, counts.item), (0, 10, 40));

    let tuples = tuple_store(&rows);
    let counts = DatasetIter::new(&tuples).aggregate_counts();
    assert_eq!((counts.global, counts.user, counts.item), (0, 10, 40));
}

#[test]
#[should_panic(expected = "advance past the end")]
fn advance_past_end_panics() {
    let mut store = TupleStore::new(StoreCapacity::new(1, 1));
    store.push_row(0, &[(0, 1.0)]);
    let mut iter = DatasetIter::new(&store);
    iter.advance();
    iter.advance();
}

// =============================================================================
// Masking
// =============================================================================

/// User 0 rates items 0 and 1; user 1 rates item 1.
fn mask_store() -> TupleStore {
    let mut store = TupleStore::new(StoreCapacity::new(2, 3));
    store.push_row(0, &[(0, 5.0), (1, 3.0)]);
    store.push_row(1, &[(1, 4.0)]);
    store
}

#[rstest]
#[case::join(MaskMode::Join, vec![(0, vec![(0, 5.0)])])]
#[case::union(MaskMode::Union, vec![(0, vec![(0, 5.0), (1, 3.0)])])]
fn accessible_user_with_hidden_item(#[case] mode: MaskMode, #[case] expected: Vec<(u32, Vec<(u32, f32)>)>) {
    let store = mask_store();
    let users = [true, false];
    let items = [true, false];
    let mut iter = DatasetIter::masked(&store, GroupMask::new(&users, &items, mode));

    let mut seen = Vec::new();
    iter.for_each_record(|r| seen.push((r.user_id().unwrap(), r.items().collect::<Vec<_>>())));
    assert_eq!(seen, expected);
}

#[test]
fn join_hides_row_union_keeps_it() {
    let store = mask_store();
    // User 1 is accessible, its only item is not.
    let users = [false, true];
    let items = [true, false];

    let mut join = DatasetIter::masked(&store, GroupMask::join(&users, &items));
    let mut union = DatasetIter::masked(&store, GroupMask::union(&users, &items));

    let joined: Vec<_> = one_pass(&mut join).into_iter().map(|r| r.row).collect();
    let unioned: Vec<_> = one_pass(&mut union).into_iter().map(|r| r.row).collect();
    assert!(!joined.contains(&1));
    assert!(unioned.contains(&1));
}

#[test]
fn masked_counts_follow_projection() {
    let store = mask_store();
    let users = [true, true];
    let items = [false, true];
    let iter = DatasetIter::masked(&store, GroupMask::join(&users, &items));
    assert_eq!(iter.num_rows(), 2);
    assert_eq!(iter.aggregate_counts().item, 2);
}

#[test]
fn ids_beyond_mask_are_inaccessible() {
    let store = mask_store();
    let mut iter = DatasetIter::masked(&store, GroupMask::union(&[], &[]));
    assert_eq!(iter.num_rows(), 0);
    assert!(iter.next_record().is_none());
}

#[test]
fn masked_pass_is_restartable() {
    let rows = synthetic_ratings(12, 10, 4, 2, 8, 0.3);
    let store = grouped_store(&rows, true);
    let users: Vec<bool> = (0..12).map(|u| u % 2 == 0).collect();
    let items: Vec<bool> = (0..10).map(|i| i % 3 != 0).collect();
    let mut iter = DatasetIter::masked(&store, GroupMask::join(&users, &items));

    let first = one_pass(&mut iter);
    iter.refresh();
    assert_eq!(first, one_pass(&mut iter));
    for row in &first {
        assert!(users[row.user.indices[0] as usize]);
        assert!(row.item.indices.iter().all(|&i| items[i as usize]));
    }
}

// =============================================================================
// View bounds
// =============================================================================

const INTS: [u32; 6] = [10, 11, 12, 13, 14, 15];

#[test]
fn in_range_reads_never_fault() {
    let view = RefVector::ints(&INTS, 2, 3);
    assert_eq!((0..view.len()).map(|i| view.int_value(i)).collect::<Vec<_>>(), vec![12, 13, 14]);

    let projection: [u32; 2] = [2, 0];
    let prj = PrjRefVector::new(view, Some(&projection[..]));
    assert_eq!(prj.len(), 2);
    assert_eq!((prj.int_value(0), prj.int_value(1)), (14, 12));
}

#[rstest]
#[case::at_len(3)]
#[case::inside_backing_array(4)]
#[case::far_out(usize::MAX)]
#[should_panic(expected = "out of bounds")]
fn out_of_range_read_panics(#[case] i: usize) {
    RefVector::ints(&INTS, 2, 3).get(i);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn projected_read_checks_projection_length() {
    let projection: [u32; 1] = [0];
    PrjRefVector::new(RefVector::ints(&INTS, 0, 6), Some(&projection[..])).get(1);
}

#[test]
fn projected_write_resolves_through_projection() {
    let mut data = [1.0f32, 2.0, 3.0, 4.0, 5.0];
    let projection: [u32; 2] = [3, 1];
    {
        let mut view = RefVectorMut::new(RefDataMut::Floats(&mut data), 1, 4).project(&projection[..]);
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0), 5.0);
        view.set(0, 9.0);
        view.set(1, -1.0);
        assert_eq!(view.as_view().float_value(1), -1.0);
    }
    assert_eq!(data, [1.0, 2.0, -1.0, 4.0, 9.0]);
}

#[test]
fn projected_write_on_quantized_store() {
    let mut store = GroupedStore::quantized(StoreCapacity::new(1, 3), QuantDict::new());
    store.push_row(1.0, [&[], &[], &[(0, 1.0), (1, 2.0), (2, 3.0)]]);
    let projection: [u32; 1] = [2];
    store.values_mut(0, FeatureGroup::Item).project(&projection[..]).set(0, 4.5);

    let mut iter = DatasetIter::new(&store);
    assert_eq!(iter.advance().items().collect::<Vec<_>>(), vec![(0, 1.0), (1, 2.0), (2, 4.5)]);
}

#[rstest]
#[case::at_projection_len(2)]
#[case::inside_base_view(3)]
#[should_panic(expected = "out of bounds")]
fn out_of_range_projected_write_panics(#[case] i: usize) {
    let mut data = [0.0f32; 6];
    let projection: [u32; 2] = [0, 5];
    let mut view = PrjRefVectorMut::new(RefVectorMut::new(RefDataMut::Floats(&mut data), 0, 6), Some(&projection[..]));
    view.set(i, 1.0);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn projection_entry_past_base_view_panics() {
    let mut data = [0.0f32; 6];
    let projection: [u32; 1] = [4];
    let mut view = RefVectorMut::new(RefDataMut::Floats(&mut data), 0, 3).project(&projection[..]);
    view.set(0, 1.0);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn out_of_range_write_panics() {
    let mut store = GroupedStore::new(StoreCapacity::new(1, 2));
    store.push_row(1.0, [&[], &[], &[(0, 1.0), (1, 2.0)]]);
    let mut view: RefVectorMut<'_> = store.values_mut(0, FeatureGroup::Item);
    view.set(2, 0.0);
}

#[test]
fn in_range_write_updates_the_store() {
    let mut store = GroupedStore::new(StoreCapacity::new(1, 2));
    store.push_row(1.0, [&[], &[], &[(0, 1.0), (1, 2.0)]]);
    store.values_mut(0, FeatureGroup::Item).set(1, 7.5);

    let mut iter = DatasetIter::new(&store);
    assert_eq!(iter.advance().items().collect::<Vec<_>>(), vec![(0, 1.0), (1, 7.5)]);
}
