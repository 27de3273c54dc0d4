//! Protobuf wire messages.
//!
//! These are the binary forms carried by the gRPC services. They mirror this
//! schema:
//!
//! ```protobuf
//! message EnvelopeHeader {
//!     uint32 command = 1;
//!     string requester_id = 2;
//!     int32 encoding = 3;
//! }
//!
//! message EnvelopeRequest {
//!     EnvelopeHeader header = 1;
//!     bytes payload = 2;
//! }
//!
//! message EnvelopeReply {
//!     uint32 command = 1;
//!     bytes payload = 2;
//! }
//! ```
//!
//! Application code should use [`crate::envelope`] types; conversion happens
//! at the gRPC boundary.

use bytes::Bytes;

/// Binary form of [`crate::envelope::EnvelopeHeader`].
#[derive(Clone, PartialEq, prost::Message)]
pub struct EnvelopeHeader {
    /// Target command.
    #[prost(uint32, tag = "1")]
    pub command: u32,
    /// Caller session correlation id.
    #[prost(string, tag = "2")]
    pub requester_id: String,
    /// Integer encoding value, see [`crate::Encoding::from_wire`].
    #[prost(int32, tag = "3")]
    pub encoding: i32,
}

/// Binary form of [`crate::envelope::EnvelopeRequest`].
#[derive(Clone, PartialEq, prost::Message)]
pub struct EnvelopeRequest {
    /// Request header; required.
    #[prost(message, optional, tag = "1")]
    pub header: Option<EnvelopeHeader>,
    /// Opaque payload.
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
}

/// Binary form of [`crate::envelope::EnvelopeReply`].
#[derive(Clone, PartialEq, prost::Message)]
pub struct EnvelopeReply {
    /// Echoed command.
    #[prost(uint32, tag = "1")]
    pub command: u32,
    /// Opaque payload.
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
}
