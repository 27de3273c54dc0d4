//! REST handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatekit_core::{EnvelopeReply, EnvelopeRequest, Gateway, GatewayError, Invoker};
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::state::GatewayState;

/// Decode a JSON envelope and run it through the gateway.
pub(crate) async fn process_json<I: Invoker>(
    gateway: &Gateway<I>,
    body: &[u8],
) -> Result<EnvelopeReply, AdapterError> {
    let request = EnvelopeRequest::decode_json(body).map_err(GatewayError::from)?;
    Ok(gateway.handle(request).await?)
}

/// Handle `POST <rest_path>`.
///
/// The body is a JSON envelope request; the response is the JSON envelope
/// reply. Malformed envelopes get `400`, routing and backend failures `500`.
pub async fn handle_rest<I: Invoker>(
    State(state): State<GatewayState<I>>,
    body: Bytes,
) -> Response {
    debug!(len = body.len(), "REST envelope received");

    let result = process_json(&state.gateway, &body)
        .await
        .and_then(|reply| Ok(reply.encode_json()?));

    match result {
        Ok(json) => (
            StatusCode::OK,
            [("content-type", "application/json")],
            json,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, transport = "rest", "Request failed");
            err.into_response()
        }
    }
}

/// Handle `GET /health`.
pub async fn handle_health() -> &'static str {
    "OK"
}
