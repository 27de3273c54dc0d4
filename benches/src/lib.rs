//! Benchmarks for gatekit.
//!
//! Criterion benchmarks for the hot paths of the gateway:
//!
//! - **Envelope**: JSON and binary encode/decode of request and reply envelopes
//! - **Routing**: `RoutingTable::resolve` over tables of increasing size
//! - **Pipeline**: resolve-then-invoke through `Gateway::handle` and backend dispatch
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench --package gatekit-benches
//! cargo bench --package gatekit-benches --bench routing
//! ```
//!
//! Quick validation run:
//! ```bash
//! cargo bench --package gatekit-benches -- --sample-size 10
//! ```
