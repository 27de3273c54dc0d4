//! # gatekit-core
//!
//! Core types for the gatekit protocol gateway.
//!
//! gatekit accepts requests over gRPC, REST and WebSocket, wraps each one in a
//! transport-agnostic envelope, routes it to a backend by its command number,
//! and hands the backend's reply back in the caller's transport. This crate
//! holds everything that does not depend on a particular transport:
//!
//! - **Envelope model**: [`EnvelopeRequest`] / [`EnvelopeReply`] with binary and JSON forms
//! - **Encodings**: [`Encoding`] with uniform payload `decode`/`encode`
//! - **Routing**: [`RoutingTable`] mapping command ranges to backends
//! - **Invoker seam**: the [`Invoker`] trait implemented by backend clients
//! - **Pipeline**: [`Gateway`], the resolve-then-invoke path every adapter uses
//! - **Configuration**: [`GatewayConfig`] loaded from JSON
//!
//! # Example
//!
//! ```rust
//! use gatekit_core::{EnvelopeRequest, Encoding, RoutingTable};
//!
//! let routes = RoutingTable::builder()
//!     .route(1000..2000, "http://127.0.0.1:50052", "gatekit.backend.EnvelopeBackend/HandleEnvelope")
//!     .build()
//!     .unwrap();
//!
//! let request = EnvelopeRequest::new(1000, br#"{"name":"rest req"}"#.to_vec())
//!     .with_requester_id("uid123")
//!     .with_encoding(Encoding::Json);
//!
//! let route = routes.resolve(request.command()).unwrap();
//! assert_eq!(route.backend_address, "http://127.0.0.1:50052");
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod invoke;
pub mod routing;
pub mod wire;

pub use config::{GatewayConfig, RouteConfig};
pub use encoding::{Encoding, Payload};
pub use envelope::{EnvelopeHeader, EnvelopeReply, EnvelopeRequest};
pub use error::{
    ConfigError, DecodeError, EncodeError, GatewayError, InvokeError, InvokeErrorKind,
    RoutingError,
};
pub use gateway::{DEFAULT_INVOKE_TIMEOUT, Gateway};
pub use invoke::Invoker;
pub use routing::{CommandRange, RouteEntry, RoutingTable, RoutingTableBuilder};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use gatekit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::GatewayConfig;
    pub use crate::encoding::{Encoding, Payload};
    pub use crate::envelope::{EnvelopeHeader, EnvelopeReply, EnvelopeRequest};
    pub use crate::error::{DecodeError, GatewayError, InvokeError, RoutingError};
    pub use crate::gateway::Gateway;
    pub use crate::invoke::Invoker;
    pub use crate::routing::{RouteEntry, RoutingTable};
}
