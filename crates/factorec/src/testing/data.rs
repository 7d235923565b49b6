use rand::prelude::*;

use crate::data::{GroupedStore, QuantDict, StoreCapacity, TupleStore};

/// One user's observed ratings, items in ascending order.
#[derive(Clone, Debug, PartialEq)]
pub struct RatingRow {
    pub user: u32,
    pub items: Vec<(u32, f32)>,
}

/// Ratings drawn from a planted rank-`rank` model on a half-star scale.
///
/// Every user rates `per_user` distinct items (capped at `n_items`).
/// Ratings are `3 + ⟨p_u, q_i⟩ + noise`, rounded to 0.5 and clamped into
/// `[1, 5]`, so a quantized store needs at most nine codes.
pub fn synthetic_ratings(
    n_users: usize,
    n_items: usize,
    per_user: usize,
    rank: usize,
    seed: u64,
    noise_amplitude: f32,
) -> Vec<RatingRow> {
    assert!(n_items > 0 || per_user == 0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut factors = |n: usize| -> Vec<f32> { (0..n * rank).map(|_| rng.r#gen::<f32>() * 2.0 - 1.0).collect() };
    let user_factors = factors(n_users);
    let item_factors = factors(n_items);

    let per_user = per_user.min(n_items);
    let mut all_items: Vec<u32> = (0..n_items as u32).collect();
    (0..n_users)
        .map(|u| {
            let (picked, _) = all_items.partial_shuffle(&mut rng, per_user);
            let mut picked = picked.to_vec();
            picked.sort_unstable();
            let items = picked
                .into_iter()
                .map(|i| {
                    let p = &user_factors[u * rank..(u + 1) * rank];
                    let q = &item_factors[i as usize * rank..(i as usize + 1) * rank];
                    let dot: f32 = p.iter().zip(q).map(|(a, b)| a * b).sum();
                    let noise = (rng.r#gen::<f32>() * 2.0 - 1.0) * noise_amplitude;
                    let rating = ((3.0 + dot + noise) * 2.0).round() / 2.0;
                    (i, rating.clamp(1.0, 5.0))
                })
                .collect();
            RatingRow { user: u as u32, items }
        })
        .collect()
}

/// Deterministic held-out split at the rating level.
///
/// Each rating goes to the test side with probability `test_fraction`.
/// Returns `(train, test)`; users left without ratings on a side are dropped
/// from that side.
pub fn split_rows(rows: &[RatingRow], test_fraction: f32, seed: u64) -> (Vec<RatingRow>, Vec<RatingRow>) {
    assert!((0.0..1.0).contains(&test_fraction));
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(rows.len());
    let mut test = Vec::new();
    for row in rows {
        let (held, kept): (Vec<_>, Vec<_>) = row
            .items
            .iter()
            .copied()
            .partition(|_| rng.r#gen::<f32>() < test_fraction);
        if !kept.is_empty() {
            train.push(RatingRow { user: row.user, items: kept });
        }
        if !held.is_empty() {
            test.push(RatingRow { user: row.user, items: held });
        }
    }
    (train, test)
}

fn capacity(rows: &[RatingRow], extra_per_row: usize) -> StoreCapacity {
    let values = rows.iter().map(|r| r.items.len() + extra_per_row).sum();
    StoreCapacity::new(rows.len(), values)
}

/// Flat-COO store holding `rows`.
pub fn tuple_store(rows: &[RatingRow]) -> TupleStore {
    let mut store = TupleStore::new(capacity(rows, 0));
    for row in rows.iter().filter(|r| !r.items.is_empty()) {
        store.push_row(row.user, &row.items);
    }
    store
}

/// Grouped-CSR store with one user pair and the ratings as item pairs.
///
/// The label is the row's mean rating. With `quantize`, values are stored
/// through a dictionary seeded with the half-star scale.
pub fn grouped_store(rows: &[RatingRow], quantize: bool) -> GroupedStore {
    let cap = capacity(rows, 1);
    let mut store = if quantize {
        GroupedStore::quantized(cap, QuantDict::with_values((2..=10).map(|s| s as f32 / 2.0)))
    } else {
        GroupedStore::new(cap)
    };
    for row in rows {
        let mean = if row.items.is_empty() {
            0.0
        } else {
            row.items.iter().map(|&(_, r)| r).sum::<f32>() / row.items.len() as f32
        };
        store.push_row(mean, [&[], &[(row.user, 1.0)], &row.items]);
    }
    store
}

/// Text form of a row in the grouped-CSR format.
pub fn grouped_line(label: f32, global: &[(u32, f32)], user: &[(u32, f32)], item: &[(u32, f32)]) -> String {
    let mut line = format!("{} {} {} {}", label, global.len(), user.len(), item.len());
    for (idx, val) in global.iter().chain(user).chain(item) {
        line.push_str(&format!(" {idx}:{val}"));
    }
    line
}

/// Text form of a row in the flat-COO format.
pub fn tuple_line(row: &RatingRow) -> String {
    let mut line = format!("0 0 1 {} {}:1", row.items.len(), row.user);
    for (item, rating) in &row.items {
        line.push_str(&format!(" {item}:{rating}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BackingStore, DatasetIter, Ingest};

    #[test]
    fn ratings_are_seeded_and_on_scale() {
        let a = synthetic_ratings(20, 15, 5, 3, 7, 0.3);
        let b = synthetic_ratings(20, 15, 5, 3, 7, 0.3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        for row in &a {
            assert_eq!(row.items.len(), 5);
            assert!(row.items.windows(2).all(|w| w[0].0 < w[1].0));
            assert!(row
                .items
                .iter()
                .all(|&(_, r)| (1.0..=5.0).contains(&r) && (r * 2.0).fract() == 0.0));
        }
    }

    #[test]
    fn split_partitions_every_rating() {
        let rows = synthetic_ratings(30, 10, 6, 2, 1, 0.0);
        let (train, test) = split_rows(&rows, 0.25, 9);
        let total: usize = rows.iter().map(|r| r.items.len()).sum();
        let kept: usize = train.iter().chain(&test).map(|r| r.items.len()).sum();
        assert_eq!(kept, total);
        assert!(!test.is_empty());
    }

    #[test]
    fn stores_agree_with_rows() {
        let rows = synthetic_ratings(8, 6, 3, 2, 4, 0.1);
        let tuples = tuple_store(&rows);
        let grouped = grouped_store(&rows, true);
        assert_eq!(tuples.num_rows(), 8);
        assert_eq!(grouped.num_rows(), 8);
        assert_eq!(tuples.num_values(), 24);
        assert!(grouped.dict().is_some_and(|d| d.len() <= 9));

        let mut seen = Vec::new();
        DatasetIter::new(&grouped).for_each_record(|r| {
            seen.push(RatingRow {
                user: r.user_id().unwrap(),
                items: r.items().collect(),
            })
        });
        assert_eq!(seen, rows);
    }

    #[test]
    fn text_lines_ingest() {
        let rows = synthetic_ratings(3, 4, 2, 1, 2, 0.0);
        let mut store = TupleStore::new(StoreCapacity::new(3, 6));
        for row in &rows {
            store.ingest(&tuple_line(row)).unwrap();
        }
        let expected = tuple_store(&rows);
        assert_eq!(store.col_indices(), expected.col_indices());
        assert_eq!(store.ratings(), expected.ratings());
        assert_eq!(store.row_indices(), expected.row_indices());

        let line = grouped_line(4.5, &[], &[(7, 1.0)], &[(10, 2.0), (11, 3.0)]);
        assert_eq!(line, "4.5 0 1 2 7:1 10:2 11:3");
    }
}
