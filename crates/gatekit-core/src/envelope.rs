//! The transport-agnostic envelope.
//!
//! An [`EnvelopeRequest`] is a header (command, requester id, payload
//! encoding) plus an opaque payload. An [`EnvelopeReply`] echoes the command
//! and carries the backend's opaque payload, encoded the same way as the
//! request that produced it.
//!
//! Both types have two wire forms:
//!
//! - **binary** (protobuf, see [`crate::wire`]) for gRPC unary and streaming calls
//! - **JSON** for REST and WebSocket
//!
//! # JSON form
//!
//! ```json
//! {"header":{"command":1000,"requester_id":"uid123","encoding":"JSON"},"payload":"eyJuYW1lIjoid3MifQ=="}
//! ```
//!
//! The payload is standard base64. Older clients that send `head`/`cmd`/`uid`/`body`
//! (and read `cmd`/`data` on replies) are accepted on input.

use bytes::Bytes;
use prost::Message as _;
use serde::{Deserialize, Serialize};

use crate::encoding::Encoding;
use crate::error::{DecodeError, EncodeError};
use crate::wire;

/// Envelope header. Only `command` and `encoding` are inspected by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvelopeHeader {
    /// Identifies the target operation; selects the route.
    #[serde(default, alias = "cmd")]
    pub command: u32,
    /// Opaque caller session id, forwarded untouched.
    #[serde(default, alias = "uid")]
    pub requester_id: String,
    /// How the payload is encoded.
    #[serde(default)]
    pub encoding: Encoding,
}

impl EnvelopeHeader {
    /// Create a header for a command with binary encoding and no requester id.
    #[must_use]
    pub fn new(command: u32) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }
}

/// A request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeRequest {
    /// Routing and decoding metadata.
    #[serde(alias = "head")]
    pub header: EnvelopeHeader,
    /// Opaque payload, meaning defined by the command.
    #[serde(default, alias = "body", with = "base64_bytes")]
    pub payload: Bytes,
}

impl EnvelopeRequest {
    /// Create a request for `command` carrying `payload`.
    pub fn new(command: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            header: EnvelopeHeader::new(command),
            payload: payload.into(),
        }
    }

    /// Set the requester id.
    pub fn with_requester_id(mut self, requester_id: impl Into<String>) -> Self {
        self.header.requester_id = requester_id.into();
        self
    }

    /// Set the payload encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.header.encoding = encoding;
        self
    }

    /// The command this request targets.
    #[must_use]
    pub const fn command(&self) -> u32 {
        self.header.command
    }

    /// The payload encoding.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.header.encoding
    }

    /// Build the reply to this request, echoing its command.
    pub fn reply(&self, payload: impl Into<Bytes>) -> EnvelopeReply {
        EnvelopeReply::new(self.header.command, payload)
    }

    /// Decode the JSON form.
    pub fn decode_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode the JSON form.
    pub fn encode_json(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode the binary form.
    pub fn decode_binary(bytes: &[u8]) -> Result<Self, DecodeError> {
        wire::EnvelopeRequest::decode(bytes)?.try_into()
    }

    /// Encode the binary form.
    #[must_use]
    pub fn encode_binary(&self) -> Vec<u8> {
        wire::EnvelopeRequest::from(self.clone()).encode_to_vec()
    }
}

impl From<EnvelopeRequest> for wire::EnvelopeRequest {
    fn from(request: EnvelopeRequest) -> Self {
        Self {
            header: Some(wire::EnvelopeHeader {
                command: request.header.command,
                requester_id: request.header.requester_id,
                encoding: request.header.encoding.to_wire(),
            }),
            payload: request.payload,
        }
    }
}

impl TryFrom<wire::EnvelopeRequest> for EnvelopeRequest {
    type Error = DecodeError;

    fn try_from(request: wire::EnvelopeRequest) -> Result<Self, Self::Error> {
        let header = request.header.ok_or(DecodeError::MissingHeader)?;
        Ok(Self {
            header: EnvelopeHeader {
                command: header.command,
                requester_id: header.requester_id,
                encoding: Encoding::from_wire(header.encoding),
            },
            payload: request.payload,
        })
    }
}

/// A reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeReply {
    /// The command of the originating request, for correlation on
    /// multiplexed connections.
    #[serde(default, alias = "cmd")]
    pub command: u32,
    /// Opaque payload in the request's encoding.
    #[serde(default, alias = "data", with = "base64_bytes")]
    pub payload: Bytes,
}

impl EnvelopeReply {
    /// Create a reply.
    pub fn new(command: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// Decode the JSON form.
    pub fn decode_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode the JSON form.
    pub fn encode_json(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode the binary form.
    pub fn decode_binary(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(wire::EnvelopeReply::decode(bytes)?.into())
    }

    /// Encode the binary form.
    #[must_use]
    pub fn encode_binary(&self) -> Vec<u8> {
        wire::EnvelopeReply::from(self.clone()).encode_to_vec()
    }
}

impl From<EnvelopeReply> for wire::EnvelopeReply {
    fn from(reply: EnvelopeReply) -> Self {
        Self {
            command: reply.command,
            payload: reply.payload,
        }
    }
}

impl From<wire::EnvelopeReply> for EnvelopeReply {
    fn from(reply: wire::EnvelopeReply) -> Self {
        Self {
            command: reply.command,
            payload: reply.payload,
        }
    }
}

/// Standard base64 for payload bytes; `null` or a missing field is empty.
mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => STANDARD
                .decode(text.as_bytes())
                .map(Bytes::from)
                .map_err(de::Error::custom),
            None => Ok(Bytes::new()),
        }
    }
}
