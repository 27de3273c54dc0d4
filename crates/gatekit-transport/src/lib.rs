//! gRPC plumbing for the gatekit gateway.
//!
//! This crate provides both sides of gatekit's gRPC traffic:
//!
//! - [`GrpcInvoker`]: the production [`Invoker`](gatekit_core::Invoker). It dials the
//!   backend named by a route entry, performs one unary call and drops the
//!   connection.
//! - [`GatewayGrpcService`]: the gRPC transport adapter, exposing
//!   `gatekit.gateway.EnvelopeGateway` with a unary and a bidirectional
//!   streaming method.
//!
//! | Service | Method | Shape |
//! |---------|--------|-------|
//! | `gatekit.gateway.EnvelopeGateway` | `HandleEnvelope` | unary |
//! | `gatekit.gateway.EnvelopeGateway` | `HandleEnvelopeStream` | bidirectional stream |
//! | `gatekit.backend.EnvelopeBackend` | `HandleEnvelope` | unary |
//!
//! # Example
//!
//! ```no_run
//! use gatekit_core::{Gateway, RoutingTable};
//! use gatekit_transport::{GrpcInvoker, GrpcServerConfig, grpc};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let routes = RoutingTable::builder()
//!         .route(1000..2000, "http://127.0.0.1:50052", "gatekit.backend.EnvelopeBackend/HandleEnvelope")
//!         .build()?;
//!     let gateway = Gateway::new(routes, GrpcInvoker::new());
//!
//!     let config = GrpcServerConfig::new("0.0.0.0:50051");
//!     let listener = grpc::bind(&config.addr).await?;
//!     grpc::serve_gateway(listener, gateway, &config, CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod grpc;

/// Generated tonic stubs.
#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
pub mod proto {
    /// `gatekit.gateway.EnvelopeGateway`, the client-facing service.
    pub mod gateway {
        include!(concat!(env!("OUT_DIR"), "/gatekit.gateway.EnvelopeGateway.rs"));
    }

    /// `gatekit.backend.EnvelopeBackend`, the contract every backend serves.
    pub mod backend {
        include!(concat!(env!("OUT_DIR"), "/gatekit.backend.EnvelopeBackend.rs"));
    }
}

pub use error::{GrpcError, invoke_error_from_status, status_from_gateway_error};
pub use grpc::{GatewayGrpcService, GrpcInvoker, GrpcServerConfig};

/// Re-export tonic types for convenience.
pub use tonic;
