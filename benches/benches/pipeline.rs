//! Benchmarks for the resolve-then-invoke pipeline and backend dispatch.
//!
//! The invoker calls the Greeter dispatcher in-process, so the numbers
//! exclude network cost.
//!
//! Run with: `cargo bench --package gatekit-benches --bench pipeline`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gatekit_core::{Encoding, EnvelopeRequest, Gateway, RoutingTable};
use gatekit_server::greeter_dispatcher;
use gatekit_testing::DispatcherInvoker;
use gatekit_testing::fixtures::hello_request;

fn hello(encoding: Encoding) -> EnvelopeRequest {
    hello_request(encoding, "bench")
}

fn bench_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let dispatcher = greeter_dispatcher();
    let mut group = c.benchmark_group("dispatch");

    for (name, encoding) in [("binary", Encoding::Binary), ("json", Encoding::Json)] {
        let request = hello(encoding);
        group.bench_function(name, |b| {
            b.to_async(&runtime)
                .iter(|| dispatcher.dispatch(black_box(request.clone())));
        });
    }

    group.finish();
}

fn bench_gateway_handle(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let routes = RoutingTable::builder()
        .route(1000..2000, "http://in-process", "svc/Call")
        .build()
        .unwrap();
    let gateway = Gateway::new(routes, DispatcherInvoker::new(greeter_dispatcher()));
    let mut group = c.benchmark_group("gateway_handle");

    let request = hello(Encoding::Binary);
    group.bench_function("routed", |b| {
        b.to_async(&runtime)
            .iter(|| gateway.handle(black_box(request.clone())));
    });

    let unroutable = EnvelopeRequest::new(9999, Vec::new());
    group.bench_function("unroutable", |b| {
        b.to_async(&runtime)
            .iter(|| gateway.handle(black_box(unroutable.clone())));
    });

    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_gateway_handle);
criterion_main!(benches);
