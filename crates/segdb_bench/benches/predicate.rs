//! Filter compile and evaluation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use segdb_bench::{filter_sources, random_context};
use segdb_core::Predicate;

/// Benchmark compiling each filter.
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for (i, source) in filter_sources().iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), source, |b, source| {
            b.iter(|| Predicate::compile(black_box(source)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark evaluating compiled filters.
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let mut rng = StdRng::seed_from_u64(3);
    let contexts: Vec<_> = (0..64).map(|_| random_context(&mut rng, 1, false)).collect();

    for (i, source) in filter_sources().iter().enumerate() {
        let predicate = Predicate::compile(source).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(i), &predicate, |b, predicate| {
            let mut n = 0usize;
            b.iter(|| {
                let ctx = &contexts[n % contexts.len()];
                n += 1;
                black_box(predicate.evaluate(ctx))
            });
        });
    }
    group.finish();
}

/// Benchmark deep nesting near the parser limit.
fn bench_nested(c: &mut Criterion) {
    let source = format!("{}true{}", "(".repeat(60), ")".repeat(60));
    c.bench_function("compile_nested_60", |b| {
        b.iter(|| Predicate::compile(black_box(&source)).unwrap());
    });
}

criterion_group!(benches, bench_compile, bench_evaluate, bench_nested);
criterion_main!(benches);
