//! gRPC invoker and gateway service.
//!
//! # Protocol
//!
//! Envelopes travel as protobuf messages (see `gatekit_core::wire`):
//!
//! ```protobuf
//! service EnvelopeGateway {
//!     rpc HandleEnvelope(EnvelopeRequest) returns (EnvelopeReply);
//!     rpc HandleEnvelopeStream(stream EnvelopeRequest) returns (stream EnvelopeReply);
//! }
//!
//! service EnvelopeBackend {
//!     rpc HandleEnvelope(EnvelopeRequest) returns (EnvelopeReply);
//! }
//! ```

mod invoker;
mod server;

pub use invoker::GrpcInvoker;
pub use server::{
    GatewayGrpcService, GrpcServerConfig, STREAM_BUFFER, bind, serve_gateway, server_builder,
};
