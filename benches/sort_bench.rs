//! Benchmarks for bitonic-pool
//!
//! Run with: cargo bench

use bitonic_pool::engine::{kernel, sort_sequential, Direction, SortEngine};
use bitonic_pool::input::random_values;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

const SIZE: usize = 1 << 16;

fn benchmark_kernel(c: &mut Criterion) {
    let values = random_values(SIZE, Some(7));

    c.bench_function("kernel_sort_slice", |b| {
        b.iter_batched(
            || values.clone(),
            |mut v| {
                kernel::sort_slice(&mut v, Direction::Ascending);
                black_box(v);
            },
            BatchSize::LargeInput,
        )
    });
}

fn benchmark_pool_vs_sequential(c: &mut Criterion) {
    let values = random_values(SIZE, Some(42));
    let mut group = c.benchmark_group("sort_65536");

    group.bench_function("sequential", |b| {
        b.iter_batched(
            || values.clone(),
            |v| black_box(sort_sequential(v, Direction::Descending).unwrap()),
            BatchSize::LargeInput,
        )
    });

    for workers in [1, 2, 4, 8] {
        let engine = SortEngine::new(workers, Direction::Descending).unwrap();
        group.bench_with_input(BenchmarkId::new("pool", workers), &engine, |b, engine| {
            b.iter_batched(
                || values.clone(),
                |v| black_box(engine.sort(v).unwrap()),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_kernel, benchmark_pool_vs_sequential);
criterion_main!(benches);
