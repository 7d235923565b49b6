//! Full-pass iteration cost per layout.
//!
//! Run with: `cargo bench --bench iteration`

mod common;

use common::default_criterion;

use factorec::data::{BackingStore, DatasetIter, GroupMask};
use factorec::testing::{grouped_store, synthetic_ratings, tuple_store};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn sum_pass(iter: &mut DatasetIter<'_>) -> f64 {
    let mut acc = 0.0;
    iter.for_each_record(|record| {
        for (item, rating) in record.items() {
            acc += item as f64 * rating as f64;
        }
    });
    acc
}

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration/full_pass");

    for n_users in [1_000usize, 10_000] {
        let rows = synthetic_ratings(n_users, 2_000, 50, 5, 42, 0.2);
        let nnz = (n_users * 50) as u64;
        let stores: [(&str, Box<dyn BackingStore>); 3] = [
            ("grouped", Box::new(grouped_store(&rows, false))),
            ("grouped_quantized", Box::new(grouped_store(&rows, true))),
            ("tuples", Box::new(tuple_store(&rows))),
        ];

        group.throughput(Throughput::Elements(nnz));
        for (name, store) in &stores {
            let mut iter = DatasetIter::new(store.as_ref());
            group.bench_function(BenchmarkId::new(*name, n_users), |b| {
                b.iter(|| black_box(sum_pass(&mut iter)))
            });
        }
    }
    group.finish();
}

fn bench_masked_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration/masked_pass");

    let rows = synthetic_ratings(10_000, 2_000, 50, 5, 42, 0.2);
    let store = tuple_store(&rows);
    let users: Vec<bool> = (0..10_000).map(|u| u % 2 == 0).collect();
    let items: Vec<bool> = (0..2_000).map(|i| i % 4 != 0).collect();
    group.throughput(Throughput::Elements(store.num_values() as u64));

    for (name, mask) in [
        ("join", GroupMask::join(&users, &items)),
        ("union", GroupMask::union(&users, &items)),
    ] {
        let mut iter = DatasetIter::masked(&store, mask);
        group.bench_function(name, |b| b.iter(|| black_box(sum_pass(&mut iter))));
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_full_pass, bench_masked_pass
}
criterion_main!(benches);
