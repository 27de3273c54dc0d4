//! Benchmarks for command-range resolution.
//!
//! Run with: `cargo bench --package gatekit-benches --bench routing`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gatekit_core::RoutingTable;

/// `n` adjacent ranges of 1000 commands each, starting at 1000.
fn table(n: u32) -> RoutingTable {
    (0..n)
        .fold(RoutingTable::builder(), |builder, i| {
            let low = 1000 + i * 1000;
            builder.route(
                low..low + 1000,
                format!("http://backend-{i}:50052"),
                "gatekit.backend.EnvelopeBackend/HandleEnvelope",
            )
        })
        .build()
        .unwrap()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for n in [1, 16, 256, 4096] {
        let routes = table(n);
        let last = 1000 + (n - 1) * 1000 + 999;

        group.bench_with_input(BenchmarkId::new("hit_first", n), &routes, |b, routes| {
            b.iter(|| routes.resolve(black_box(1000)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("hit_last", n), &routes, |b, routes| {
            b.iter(|| routes.resolve(black_box(last)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("miss", n), &routes, |b, routes| {
            b.iter(|| routes.resolve(black_box(5)).unwrap_err());
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for n in [16, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| table(black_box(n)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_build);
criterion_main!(benches);
