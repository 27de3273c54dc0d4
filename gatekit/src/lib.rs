//! # gatekit
//!
//! A protocol gateway for envelope-based gRPC backends. Clients speak REST,
//! WebSocket or gRPC; every request is a small envelope whose `command`
//! selects a backend through a static table of command ranges, and the
//! gateway forwards the envelope verbatim over gRPC.
//!
//! ```text
//!  REST ──┐
//!  WS   ──┼──> Gateway::handle ──> RoutingTable::resolve ──> Invoker ──> backend
//!  gRPC ──┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use gatekit::app::GatewayApp;
//! use gatekit::supervisor::shutdown_signal;
//! use gatekit::GatewayConfig;
//!
//! # async fn run() -> miette::Result<()> {
//! let app = GatewayApp::bind(GatewayConfig::default()).await?;
//! app.run_until(shutdown_signal()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`gatekit_core`] - envelopes, encodings, routing table, gateway pipeline, config
//! - [`gatekit_transport`] - gRPC invoker and gRPC gateway adapter
//! - [`gatekit_server`] - backend dispatcher and the reference Greeter
//! - [`gatekit_axum`] - REST and WebSocket adapters
//!
//! ## Binaries
//!
//! - `gatekit-gateway` - all three adapters in one process
//! - `gatekit-greeter` - the reference backend
//! - `gatekit-client` - sends greetings through each transport

#![deny(missing_docs)]
#![warn(clippy::unwrap_used)]

pub mod app;
pub mod cli;
pub mod client;
pub mod error;
pub mod logging;
pub mod supervisor;

pub use gatekit_core::*;

pub use gatekit_axum::{GatewayRouter, serve_http};
pub use gatekit_server::{Dispatcher, DispatcherBuilder, HandlerError, greeter_dispatcher};
pub use gatekit_transport::{GrpcInvoker, GrpcServerConfig};

pub use error::ServeError;

/// Prelude for convenient imports.
pub mod prelude {
    pub use gatekit_core::prelude::*;

    pub use crate::app::{BackendApp, GatewayApp};
    pub use crate::error::ServeError;
    pub use crate::supervisor::{Supervisor, shutdown_signal};
    pub use gatekit_server::{Dispatcher, HandlerError};
    pub use gatekit_transport::GrpcInvoker;
}
