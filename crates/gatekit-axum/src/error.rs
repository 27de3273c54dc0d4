//! Adapter error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatekit_core::{EncodeError, GatewayError};
use thiserror::Error;

/// Errors raised while serving a REST or WebSocket request.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Decode, routing or invoke failure from the gateway pipeline.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The reply envelope could not be serialized.
    #[error("cannot encode reply: {0}")]
    Encode(#[from] EncodeError),
}

impl AdapterError {
    /// Whether the client sent a malformed envelope.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Gateway(err) if err.is_client_error())
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Create an error response body.
    #[must_use]
    pub fn error_body(&self) -> String {
        serde_json::json!({
            "error": {
                "code": self.status_code().as_u16(),
                "message": self.to_string()
            }
        })
        .to_string()
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.error_body();

        (status, [("content-type", "application/json")], body).into_response()
    }
}
