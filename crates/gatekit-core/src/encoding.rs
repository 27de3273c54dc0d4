//! Payload encodings.
//!
//! Every envelope declares how its payload is encoded. The gateway never
//! looks inside the payload; only backend dispatchers decode it, using
//! [`Encoding::decode`] and [`Encoding::encode`] so that the reply is written
//! in the same encoding the caller chose.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DecodeError, EncodeError};

/// Wire value the reference deployment uses for JSON payloads.
const JSON_WIRE_VALUE: i32 = 2;

/// A payload type usable with either encoding.
///
/// Implemented automatically for every type that is both a protobuf message
/// and serde (de)serializable.
pub trait Payload: prost::Message + Default + Serialize + for<'de> Deserialize<'de> {}

impl<T> Payload for T where T: prost::Message + Default + Serialize + for<'de> Deserialize<'de> {}

/// How an envelope payload is encoded.
///
/// Encoding is carried per request in the envelope header; there is no
/// per-connection negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Compact protobuf encoding.
    #[default]
    Binary,
    /// JSON text encoding.
    Json,
}

impl Encoding {
    /// Map an integer wire value to an encoding.
    ///
    /// `2` is JSON; every other value, including unknown ones, is binary.
    #[must_use]
    pub const fn from_wire(value: i32) -> Self {
        if value == JSON_WIRE_VALUE {
            Self::Json
        } else {
            Self::Binary
        }
    }

    /// The integer wire value of this encoding.
    #[must_use]
    pub const fn to_wire(self) -> i32 {
        match self {
            Self::Binary => 0,
            Self::Json => JSON_WIRE_VALUE,
        }
    }

    /// The canonical name used in the JSON envelope form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Json => "JSON",
        }
    }

    /// Decode a payload.
    pub fn decode<T: Payload>(self, bytes: &[u8]) -> Result<T, DecodeError> {
        match self {
            Self::Binary => Ok(T::decode(bytes)?),
            Self::Json => Ok(serde_json::from_slice(bytes)?),
        }
    }

    /// Encode a payload.
    pub fn encode<T: Payload>(self, value: &T) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::Binary => Ok(value.encode_to_vec()),
            Self::Json => Ok(serde_json::to_vec(value)?),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Encoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EncodingVisitor)
    }
}

/// Accepts `"BINARY"`/`"JSON"` in any case, or the integer wire value.
struct EncodingVisitor;

impl Visitor<'_> for EncodingVisitor {
    type Value = Encoding;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"BINARY\", \"JSON\" or an integer encoding value")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Encoding, E> {
        if value.eq_ignore_ascii_case("json") {
            Ok(Encoding::Json)
        } else if value.eq_ignore_ascii_case("binary") {
            Ok(Encoding::Binary)
        } else {
            Err(E::unknown_variant(value, &["BINARY", "JSON"]))
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Encoding, E> {
        Ok(i32::try_from(value).map_or(Encoding::Binary, Encoding::from_wire))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Encoding, E> {
        Ok(i32::try_from(value).map_or(Encoding::Binary, Encoding::from_wire))
    }
}
