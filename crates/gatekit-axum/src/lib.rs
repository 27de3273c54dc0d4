//! REST and WebSocket adapters for gatekit, built on Axum.
//!
//! Both adapters speak the JSON envelope form and hand every request to a
//! [`Gateway`](gatekit_core::Gateway), which resolves the command and calls
//! the owning backend.
//!
//! # Endpoints
//!
//! | Method | Path | Behavior |
//! |--------|------|----------|
//! | `POST` | `rest_path` | One JSON envelope in, one JSON envelope out |
//! | `GET`  | `ws_path` | WebSocket; one envelope per frame, replies in order |
//! | `GET`  | `/health` | Returns `OK` |
//!
//! # REST status codes
//!
//! - `200` with the reply envelope on success
//! - `400` when the body is not a valid envelope
//! - `413` when the body exceeds the configured message size
//! - `500` for unroutable commands and backend failures
//!
//! Error bodies look like `{"error": {"code": 400, "message": "..."}}`.
//!
//! # Quick Start
//!
//! ```ignore
//! use gatekit_axum::{GatewayRouter, serve_http};
//! use gatekit_core::{Gateway, RoutingTable};
//! use gatekit_transport::GrpcInvoker;
//! use tokio_util::sync::CancellationToken;
//!
//! let routes = RoutingTable::builder()
//!     .route(1000..2000, "http://127.0.0.1:50052", "gatekit.backend.EnvelopeBackend/HandleEnvelope")
//!     .build()?;
//! let router = GatewayRouter::new(Gateway::new(routes, GrpcInvoker::new()))
//!     .with_tracing()
//!     .into_router();
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:50050").await?;
//! serve_http(listener, router, CancellationToken::new()).await?;
//! ```
//!
//! # Client Example (curl)
//!
//! ```bash
//! curl -X POST http://localhost:50050/grpc_gateway.RestService \
//!   -H "Content-Type: application/json" \
//!   -d '{"header":{"command":1000,"requester_id":"uid123","encoding":"JSON"},"payload":"eyJuYW1lIjoicmVzdCByZXEifQ=="}'
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod handler;
pub mod router;
pub mod state;
pub mod ws;

pub use error::AdapterError;
pub use handler::{handle_health, handle_rest};
pub use router::{GatewayRouter, HEALTH_PATH, serve_http};
pub use state::{GatewayState, WsSettings};
pub use ws::handle_ws;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::AdapterError;
    pub use crate::router::{GatewayRouter, serve_http};
    pub use crate::state::GatewayState;
}
