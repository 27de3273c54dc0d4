//! Backend side of gatekit.
//!
//! A backend receives envelopes from the gateway over
//! `gatekit.backend.EnvelopeBackend/HandleEnvelope`, picks the handler
//! registered for the envelope's command, and answers in the caller's
//! encoding.
//!
//! - [`dispatcher`]: command to handler mapping with typed payloads
//! - [`greeter`]: the reference `SayHello` handler
//! - [`backend`]: gRPC hosting for a dispatcher
//!
//! # Example
//!
//! ```no_run
//! use gatekit_server::{greeter::greeter_dispatcher, serve_backend};
//! use gatekit_transport::grpc::{self, GrpcServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gatekit_transport::GrpcError> {
//!     let config = GrpcServerConfig::new("0.0.0.0:50052");
//!     let listener = grpc::bind(&config.addr).await?;
//!     serve_backend(listener, greeter_dispatcher(), &config, CancellationToken::new()).await
//! }
//! ```

#![deny(missing_docs)]

pub mod backend;
pub mod dispatcher;
pub mod greeter;

/// Generated `gatekit.greeter.Greeter` stubs.
#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/gatekit.greeter.Greeter.rs"));
}

pub use backend::{BackendService, serve_backend, status_from_dispatch_error};
pub use dispatcher::{DispatchError, Dispatcher, DispatcherBuilder, HandlerError};
pub use greeter::{GreeterService, HelloReply, HelloRequest, SAY_HELLO, greeter_dispatcher};
