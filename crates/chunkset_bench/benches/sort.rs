//! Rewrite benchmarks: external sort and bulk removal.

use chunkset_bench::utils::{file_store, file_store_with, random_integers, random_keys};
use chunkset_core::Config;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const ELEMENTS: usize = 20_000;

/// Benchmark sorting distinct and collision-heavy data.
fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ELEMENTS as u64));

    let distinct = random_integers(ELEMENTS, u64::MAX, 3);
    let collisions = random_integers(ELEMENTS, 256, 4);

    for (name, values) in [("distinct", &distinct), ("collisions", &collisions)] {
        group.bench_with_input(BenchmarkId::new(name, 1024), values, |b, values| {
            b.iter(|| {
                let mut store = file_store::<u64>(1024);
                store.add_all(values.iter().copied()).unwrap();
                black_box(store.sort().unwrap());
            });
        });
    }

    let keys = random_keys(ELEMENTS, 6, 5);
    group.bench_function("hex_keys", |b| {
        b.iter(|| {
            let mut store = file_store::<String>(1024);
            store.add_all(keys.iter().cloned()).unwrap();
            black_box(store.sort().unwrap());
        });
    });

    group.finish();
}

/// Benchmark the merge fan-in with many small runs.
fn bench_fan_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_fan_in");
    group.sample_size(10);

    let values = random_integers(ELEMENTS, u64::MAX, 6);
    for fan_in in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(fan_in), &fan_in, |b, &fan_in| {
            b.iter(|| {
                let config = Config::new().chunk_size(128).merge_fan_in(fan_in);
                let mut store = file_store_with::<u64>(config);
                store.add_all(values.iter().copied()).unwrap();
                black_box(store.sort().unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark bulk removal with resident and streamed arguments.
fn bench_remove_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_all");
    group.sample_size(10);

    let values: Vec<u64> = (0..ELEMENTS as u64).collect();
    let evens: Vec<u64> = values.iter().copied().filter(|v| v % 2 == 0).collect();

    group.bench_function("resident", |b| {
        b.iter(|| {
            let config = Config::new().chunk_size(1024).membership_budget(ELEMENTS);
            let mut store = file_store_with::<u64>(config);
            store.add_all(values.iter().copied()).unwrap();
            black_box(store.remove_all(&evens).unwrap());
        });
    });

    group.bench_function("streamed", |b| {
        b.iter(|| {
            let mut store = file_store::<u64>(1024);
            store.add_all(values.iter().copied()).unwrap();
            black_box(store.remove_all(&evens).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sort, bench_fan_in, bench_remove_all);
criterion_main!(benches);
