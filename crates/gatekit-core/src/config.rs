//! Static gateway configuration.
//!
//! Loaded from a JSON file; every field has a default that reproduces the
//! reference deployment, so an empty object `{}` is a valid config.
//!
//! ```json
//! {
//!   "grpc_addr": "0.0.0.0:50051",
//!   "http_addr": "0.0.0.0:50050",
//!   "invoke_timeout_ms": 1000,
//!   "routes": [
//!     {"low": 1000, "high": 2000, "address": "http://127.0.0.1:50052",
//!      "interface": "gatekit.backend.EnvelopeBackend/HandleEnvelope"}
//!   ]
//! }
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::routing::{CommandRange, RouteEntry, RoutingTable};

/// Default gRPC listener address.
pub const DEFAULT_GRPC_ADDR: &str = "0.0.0.0:50051";
/// Default HTTP/WebSocket listener address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:50050";
/// Default REST endpoint path.
pub const DEFAULT_REST_PATH: &str = "/grpc_gateway.RestService";
/// Default WebSocket endpoint path.
pub const DEFAULT_WS_PATH: &str = "/grpc_gateway.WsService";
/// Path of the HTTP health check. Endpoint paths may not reuse it.
pub const HEALTH_PATH: &str = "/health";
/// Default largest accepted message, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
/// Default backend address of the Greeter service.
pub const DEFAULT_BACKEND_ADDR: &str = "http://127.0.0.1:50052";
/// Method path of the envelope backend service.
pub const BACKEND_INTERFACE: &str = "gatekit.backend.EnvelopeBackend/HandleEnvelope";

/// A route as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Inclusive lower command bound.
    pub low: u32,
    /// Exclusive upper command bound.
    pub high: u32,
    /// Backend URI.
    pub address: String,
    /// Backend method path.
    #[serde(default = "default_interface")]
    pub interface: String,
}

impl RouteConfig {
    /// Convert to a validated route entry.
    pub fn to_entry(&self) -> Result<RouteEntry, ConfigError> {
        let range = CommandRange::new(self.low, self.high)?;
        Ok(RouteEntry::new(range, &self.address, &self.interface))
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// gRPC listener address.
    pub grpc_addr: String,
    /// HTTP/WebSocket listener address.
    pub http_addr: String,
    /// REST endpoint path.
    pub rest_path: String,
    /// WebSocket endpoint path.
    pub ws_path: String,
    /// Backend call deadline in milliseconds.
    pub invoke_timeout_ms: u64,
    /// Largest accepted request body or frame, in bytes.
    pub max_message_size: usize,
    /// Close WebSocket connections idle for this long.
    pub ws_idle_timeout_ms: Option<u64>,
    /// Command routes.
    pub routes: Vec<RouteConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            grpc_addr: DEFAULT_GRPC_ADDR.to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            rest_path: DEFAULT_REST_PATH.to_string(),
            ws_path: DEFAULT_WS_PATH.to_string(),
            invoke_timeout_ms: 1000,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            ws_idle_timeout_ms: None,
            routes: vec![RouteConfig {
                low: 1000,
                high: 2000,
                address: DEFAULT_BACKEND_ADDR.to_string(),
                interface: default_interface(),
            }],
        }
    }
}

impl GatewayConfig {
    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Build the routing table.
    pub fn routing_table(&self) -> Result<RoutingTable, ConfigError> {
        let entries = self
            .routes
            .iter()
            .map(RouteConfig::to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RoutingTable::new(entries)?)
    }

    /// Parsed gRPC listener address.
    pub fn grpc_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("grpc_addr", &self.grpc_addr)
    }

    /// Parsed HTTP listener address.
    pub fn http_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("http_addr", &self.http_addr)
    }

    /// Backend call deadline.
    #[must_use]
    pub const fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_timeout_ms)
    }

    /// WebSocket idle timeout, if any.
    #[must_use]
    pub fn ws_idle_timeout(&self) -> Option<Duration> {
        self.ws_idle_timeout_ms.map(Duration::from_millis)
    }

    /// Check every field that can be wrong without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grpc_socket_addr()?;
        self.http_socket_addr()?;
        check_path("rest_path", &self.rest_path)?;
        check_path("ws_path", &self.ws_path)?;
        if self.rest_path == self.ws_path {
            return Err(ConfigError::InvalidPath {
                field: "ws_path",
                value: self.ws_path.clone(),
                reason: "must differ from rest_path",
            });
        }
        self.routing_table()?;
        Ok(())
    }
}

fn default_interface() -> String {
    BACKEND_INTERFACE.to_string()
}

/// Endpoint paths are literal routes: rooted, capture-free, and clear of the
/// health check.
fn check_path(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let reason = if !value.starts_with('/') {
        "must start with '/'"
    } else if value == HEALTH_PATH {
        "is reserved for the health check"
    } else if value.contains(['{', '}'])
        || value.split('/').any(|segment| segment.starts_with([':', '*']))
    {
        "must not contain path parameters"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidPath {
        field,
        value: value.to_string(),
        reason,
    })
}

fn parse_addr(field: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}
