//! Shared state for the HTTP handlers.

use std::time::Duration;

use gatekit_core::Gateway;
use gatekit_core::config::DEFAULT_MAX_MESSAGE_SIZE;

/// WebSocket connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsSettings {
    /// Largest accepted frame or message, in bytes.
    pub max_message_size: usize,
    /// Close connections that send nothing for this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for WsSettings {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            idle_timeout: None,
        }
    }
}

/// State shared by the REST and WebSocket handlers.
pub struct GatewayState<I> {
    /// The resolve-then-invoke pipeline.
    pub gateway: Gateway<I>,
    /// WebSocket connection settings.
    pub ws: WsSettings,
}

impl<I> Clone for GatewayState<I> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            ws: self.ws,
        }
    }
}

impl<I> GatewayState<I> {
    /// Create state for a gateway.
    pub fn new(gateway: Gateway<I>, ws: WsSettings) -> Self {
        Self { gateway, ws }
    }
}
