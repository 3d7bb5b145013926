//! Chunked store benchmarks: appends, scans and membership.

use chunkset_bench::utils::{file_store, random_integers};
use chunkset_core::ChunkedStore;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const ELEMENTS: usize = 20_000;

/// Benchmark appends for several chunk sizes.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    group.sample_size(20);
    group.throughput(Throughput::Elements(ELEMENTS as u64));

    let values = random_integers(ELEMENTS, u64::MAX, 1);
    for chunk_size in [64, 1024, 8192] {
        group.bench_with_input(
            BenchmarkId::new("file", chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut store = file_store::<u64>(chunk_size);
                    store.add_all(values.iter().copied()).unwrap();
                    black_box(store.len());
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("memory", chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut store = ChunkedStore::in_memory(chunk_size).unwrap();
                    store.add_all(values.iter().copied()).unwrap();
                    black_box(store.len());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a full scan across chunk files.
fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");
    group.throughput(Throughput::Elements(ELEMENTS as u64));

    for chunk_size in [64, 1024, 8192] {
        let mut store = file_store::<u64>(chunk_size);
        store.add_all(random_integers(ELEMENTS, u64::MAX, 2)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(chunk_size), &store, |b, store| {
            b.iter(|| {
                let mut sum = 0u64;
                for element in store.iter() {
                    sum = sum.wrapping_add(element.unwrap());
                }
                black_box(sum);
            });
        });
    }

    group.finish();
}

/// Benchmark single-element lookups, hit and miss.
fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");

    let mut store = file_store::<u64>(1024);
    store.add_all(0..ELEMENTS as u64).unwrap();

    group.bench_function("last", |b| {
        b.iter(|| black_box(store.contains(black_box(&(ELEMENTS as u64 - 1))).unwrap()));
    });
    group.bench_function("missing", |b| {
        b.iter(|| black_box(store.contains(black_box(&u64::MAX)).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_add, bench_iterate, bench_contains);
criterion_main!(benches);
