//! Error types for the gateway pipeline.
//!
//! Each stage of the pipeline has its own error type:
//!
//! - [`DecodeError`] - a malformed envelope or payload
//! - [`RoutingError`] - no route for a command, or an invalid routing table
//! - [`InvokeError`] - the backend call failed
//!
//! [`GatewayError`] unifies them for adapters, which translate it into the
//! native error shape of their transport (HTTP status, gRPC status, or a
//! WebSocket close frame).

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::routing::CommandRange;

/// Failure to decode an envelope or a business payload.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes were not valid JSON for the expected structure.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The bytes were not a valid protobuf message.
    #[error("malformed binary message: {0}")]
    Binary(#[from] prost::DecodeError),

    /// A request envelope arrived without a header.
    #[error("envelope has no header")]
    MissingHeader,
}

/// Failure to encode a business payload.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Routing table errors.
///
/// `Unroutable` is a per-request condition; the other variants are raised
/// while building a table and are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No route owns the command.
    #[error("unroutable command {command}")]
    Unroutable {
        /// The command that matched no range.
        command: u32,
    },

    /// A range with `low >= high` was supplied.
    #[error("command range [{low}, {high}) is empty")]
    EmptyRange {
        /// Inclusive lower bound.
        low: u32,
        /// Exclusive upper bound.
        high: u32,
    },

    /// Two routes claim overlapping commands.
    #[error("command range {first} overlaps {second}")]
    Overlapping {
        /// The range that sorts first.
        first: CommandRange,
        /// The range that overlaps it.
        second: CommandRange,
    },
}

/// Classification of [`InvokeError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeErrorKind {
    /// The backend did not reply before the deadline.
    Timeout,
    /// The backend could not be reached.
    Unreachable,
    /// The backend replied with an application error.
    BackendRejected,
}

impl std::fmt::Display for InvokeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::BackendRejected => write!(f, "backend rejected"),
        }
    }
}

/// Failure reaching or executing on a backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The deadline elapsed before the backend replied.
    #[error("timeout: backend did not reply within {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The backend address was invalid or the connection failed.
    #[error("unreachable: backend {address}: {message}")]
    Unreachable {
        /// The backend address from the route entry.
        address: String,
        /// What went wrong.
        message: String,
    },

    /// The backend answered with an error status.
    #[error("backend rejected (code {code}): {message}")]
    BackendRejected {
        /// The backend's status code (gRPC numbering).
        code: i32,
        /// The backend's error detail.
        message: String,
    },
}

impl InvokeError {
    /// Create an unreachable error.
    pub fn unreachable(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Get the error kind.
    #[must_use]
    pub const fn kind(&self) -> InvokeErrorKind {
        match self {
            Self::Timeout { .. } => InvokeErrorKind::Timeout,
            Self::Unreachable { .. } => InvokeErrorKind::Unreachable,
            Self::BackendRejected { .. } => InvokeErrorKind::BackendRejected,
        }
    }
}

/// Any failure of the resolve-then-invoke pipeline.
#[derive(Error, Diagnostic, Debug)]
pub enum GatewayError {
    /// The inbound envelope could not be decoded.
    #[error(transparent)]
    #[diagnostic(
        code(gatekit::decode),
        help("Check the envelope against the JSON or protobuf wire format")
    )]
    Decode(#[from] DecodeError),

    /// The command has no route.
    #[error(transparent)]
    #[diagnostic(code(gatekit::routing))]
    Routing(#[from] RoutingError),

    /// The backend call failed.
    #[error(transparent)]
    #[diagnostic(code(gatekit::invoke))]
    Invoke(#[from] InvokeError),
}

impl GatewayError {
    /// Whether the caller sent something malformed, as opposed to a
    /// gateway-side or backend-side failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Configuration loading errors. All of them are fatal at startup.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {}", path.display())]
    #[diagnostic(code(gatekit::config::io))]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::config::GatewayConfig`].
    #[error("invalid config: {0}")]
    #[diagnostic(code(gatekit::config::parse))]
    Parse(#[from] serde_json::Error),

    /// A listener address does not parse as `host:port`.
    #[error("invalid {field} address '{value}'")]
    #[diagnostic(
        code(gatekit::config::address),
        help("Use the form 0.0.0.0:50051")
    )]
    InvalidAddress {
        /// The config field holding the address.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An endpoint path cannot be mounted on the HTTP router.
    #[error("invalid {field} '{value}': {reason}")]
    #[diagnostic(
        code(gatekit::config::path),
        help("Use a literal absolute path such as /grpc_gateway.RestService")
    )]
    InvalidPath {
        /// The config field holding the path.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The configured routes do not form a valid table.
    #[error("invalid routing table: {0}")]
    #[diagnostic(code(gatekit::config::routes))]
    Routes(#[from] RoutingError),
}
