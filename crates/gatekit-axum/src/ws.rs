//! WebSocket adapter.
//!
//! Each inbound text or binary frame is a JSON envelope request. Requests on
//! one connection are handled strictly one at a time, so replies come back in
//! request order, written with the same frame type as the request.
//!
//! The first failed request ends the connection with a Close frame:
//!
//! | Failure | Close code |
//! |---------|------------|
//! | malformed envelope | 1007 (invalid payload) |
//! | unroutable command, backend failure | 1011 (internal error) |
//! | idle timeout | 1001 (going away) |

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use gatekit_core::Invoker;
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::handler::process_json;
use crate::state::GatewayState;

/// Longest close reason the protocol allows, in bytes.
pub const MAX_CLOSE_REASON: usize = 123;

/// Handle `GET <ws_path>` by upgrading to a WebSocket.
pub async fn handle_ws<I: Invoker>(
    State(state): State<GatewayState<I>>,
    upgrade: WebSocketUpgrade,
) -> Response {
    let max = state.ws.max_message_size;
    upgrade
        .max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| serve_socket(socket, state))
}

/// Serve one connection until the client leaves or a request fails.
pub async fn serve_socket<I: Invoker>(mut socket: WebSocket, state: GatewayState<I>) {
    debug!("WebSocket connection opened");

    loop {
        let next = match state.ws.idle_timeout {
            Some(idle) => match tokio::time::timeout(idle, socket.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    debug!(?idle, "WebSocket idle timeout");
                    close(&mut socket, close_code::AWAY, "idle timeout").await;
                    break;
                }
            },
            None => socket.recv().await,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                debug!(error = %e, "WebSocket read failed");
                break;
            }
            None => break,
        };

        let (body, binary) = match message {
            Message::Text(text) => (text.as_str().as_bytes().to_vec(), false),
            Message::Binary(bytes) => (bytes.to_vec(), true),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break,
        };

        match reply_frame(&state, &body, binary).await {
            Ok(frame) => {
                if let Err(e) = socket.send(frame).await {
                    debug!(error = %e, "WebSocket write failed");
                    break;
                }
            }
            Err(err) => {
                warn!(error = %err, transport = "ws", "Request failed");
                let code = if err.is_client_error() {
                    close_code::INVALID
                } else {
                    close_code::ERROR
                };
                close(&mut socket, code, &err.to_string()).await;
                break;
            }
        }
    }

    debug!("WebSocket connection closed");
}

async fn reply_frame<I: Invoker>(
    state: &GatewayState<I>,
    body: &[u8],
    binary: bool,
) -> Result<Message, AdapterError> {
    let reply = process_json(&state.gateway, body).await?;
    let json = reply.encode_json()?;
    if binary {
        Ok(Message::Binary(json.into()))
    } else {
        // serde_json only writes UTF-8.
        Ok(Message::Text(String::from_utf8_lossy(&json).into_owned().into()))
    }
}

async fn close(socket: &mut WebSocket, code: u16, reason: &str) {
    let frame = CloseFrame {
        code,
        reason: truncate_reason(reason).to_string().into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Failed to send close frame");
    }
}

/// Cut `reason` to fit a close frame without splitting a character.
#[must_use]
pub fn truncate_reason(reason: &str) -> &str {
    if reason.len() <= MAX_CLOSE_REASON {
        return reason;
    }
    let mut end = MAX_CLOSE_REASON;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    &reason[..end]
}
