//! Benchmarks for envelope encoding and decoding.
//!
//! Run with: `cargo bench --package gatekit-benches --bench envelope`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use gatekit_core::{Encoding, EnvelopeReply, EnvelopeRequest};

fn request(size: usize) -> EnvelopeRequest {
    EnvelopeRequest::new(1000, vec![b'x'; size])
        .with_requester_id("uid123")
        .with_encoding(Encoding::Json)
}

const SIZES: [usize; 3] = [16, 1024, 64 * 1024];

fn bench_request_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_encode");

    for size in SIZES {
        let req = request(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("json", size), &req, |b, req| {
            b.iter(|| black_box(req).encode_json().unwrap());
        });
        group.bench_with_input(BenchmarkId::new("binary", size), &req, |b, req| {
            b.iter(|| black_box(req).encode_binary());
        });
    }

    group.finish();
}

fn bench_request_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_decode");

    for size in SIZES {
        let json = request(size).encode_json().unwrap();
        let binary = request(size).encode_binary();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("json", size), &json, |b, bytes| {
            b.iter(|| EnvelopeRequest::decode_json(black_box(bytes)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("binary", size), &binary, |b, bytes| {
            b.iter(|| EnvelopeRequest::decode_binary(black_box(bytes)).unwrap());
        });
    }

    group.finish();
}

fn bench_legacy_json(c: &mut Criterion) {
    let legacy = br#"{"head":{"cmd":1000,"uid":"uid123","encoding":"JSON"},"body":"eyJuYW1lIjoicmVzdCByZXEifQ=="}"#;

    c.bench_function("request_decode/legacy_aliases", |b| {
        b.iter(|| EnvelopeRequest::decode_json(black_box(legacy)).unwrap());
    });
}

fn bench_reply_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("reply_round_trip");
    let reply = EnvelopeReply::new(1000, vec![b'y'; 1024]);

    group.throughput(Throughput::Elements(1));
    group.bench_function("json", |b| {
        b.iter(|| {
            let bytes = black_box(&reply).encode_json().unwrap();
            EnvelopeReply::decode_json(&bytes).unwrap()
        });
    });
    group.bench_function("binary", |b| {
        b.iter(|| {
            let bytes = black_box(&reply).encode_binary();
            EnvelopeReply::decode_binary(&bytes).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_request_encode,
    bench_request_decode,
    bench_legacy_json,
    bench_reply_round_trip,
);

criterion_main!(benches);
