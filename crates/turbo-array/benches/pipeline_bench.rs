//! Criterion benchmarks for expression compilation and the array pipeline.
//!
//! Run:
//!   cargo bench -p turbo-array
//!   cargo bench -p turbo-array -- chain

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use turbo_array::{ChainOperation, Engine, EngineOptions, Expression, Operation};

const COMPLEX: &str = "sin(x) + cos(x^2) + sqrt(abs(x))";

fn make_data(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64 * 7.3) % 100.0 - 50.0).collect()
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_complex", |b| {
        b.iter(|| Expression::compile(black_box(COMPLEX)).unwrap())
    });
}

fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");
    let engine = Engine::default();
    let expr = Operation::expr(COMPLEX);
    let op = Operation::op("*", 2.0);

    for n in [100, 10_000] {
        let data = make_data(n);
        group.bench_with_input(BenchmarkId::new("expr", n), &data, |b, data| {
            b.iter(|| engine.map(black_box(data), &expr).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("op", n), &data, |b, data| {
            b.iter(|| engine.map(black_box(data), &op).unwrap())
        });
    }
    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    let stages = [
        ChainOperation::filter(Operation::expr("x > 0")),
        ChainOperation::map(Operation::expr("x * 2")),
        ChainOperation::sort(Operation::symbol("desc")),
    ];
    let cold = Engine::default();
    let cached = Engine::new(EngineOptions {
        cache_expressions: true,
        ..Default::default()
    });

    for n in [100, 10_000] {
        let data = make_data(n);
        group.bench_with_input(BenchmarkId::new("uncached", n), &data, |b, data| {
            b.iter(|| cold.chain(black_box(data), &stages).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("cached", n), &data, |b, data| {
            b.iter(|| cached.chain(black_box(data), &stages).unwrap())
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let engine = Engine::default();
    let data = make_data(10_000);
    c.bench_function("aggregate_all_10000", |b| {
        b.iter(|| engine.aggregate(black_box(&data), ["sum", "avg", "min", "max", "count"]))
    });
}

criterion_group!(benches, bench_compile, bench_map, bench_chain, bench_aggregate);
criterion_main!(benches);
