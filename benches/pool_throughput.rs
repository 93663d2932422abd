//! Benchmarks for submission and dispatch overhead

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qpool::ThreadPool;

fn bench_submit_join(c: &mut Criterion) {
    let pool = ThreadPool::with_default_threads().unwrap();

    c.bench_function("submit_join_single", |b| {
        b.iter(|| pool.submit(|| black_box(21) * 2).unwrap().join().unwrap());
    });
}

fn bench_batch_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_submit");

    for threads in [1, 2, 4, 8].iter() {
        let pool = ThreadPool::with_threads(*threads).unwrap();

        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, _| {
            b.iter(|| {
                let handles: Vec<_> = (0..1_000u64)
                    .map(|i| pool.submit(move || black_box(i * i)).unwrap())
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap())
                    .sum::<u64>()
            });
        });
    }

    group.finish();
}

fn bench_variable_workload(c: &mut Criterion) {
    let pool = ThreadPool::with_default_threads().unwrap();

    c.bench_function("variable_workload", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..1000)
                .map(|x| {
                    pool.submit(move || {
                        let n = if x % 10 == 0 { 1000 } else { 10 };
                        (0..n).sum::<i32>()
                    })
                    .unwrap()
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .sum::<i32>()
        });
    });
}

criterion_group!(
    benches,
    bench_submit_join,
    bench_batch_submit,
    bench_variable_workload
);
criterion_main!(benches);
