//! Router builder for the HTTP listener.

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use gatekit_core::config::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_REST_PATH, DEFAULT_WS_PATH};
use gatekit_core::{Gateway, GatewayConfig, Invoker};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handler::{handle_health, handle_rest};
use crate::state::{GatewayState, WsSettings};
use crate::ws::handle_ws;

pub use gatekit_core::config::HEALTH_PATH;

/// Builder for the gateway's HTTP router.
///
/// Mounts the REST endpoint, the WebSocket endpoint, and `GET /health`.
///
/// # Example
///
/// ```ignore
/// use gatekit_axum::GatewayRouter;
///
/// let router = GatewayRouter::new(gateway)
///     .rest_path("/api/envelope")
///     .with_tracing()
///     .into_router();
/// ```
pub struct GatewayRouter<I> {
    gateway: Gateway<I>,
    rest_path: String,
    ws_path: String,
    max_message_size: usize,
    ws_idle_timeout: Option<Duration>,
    enable_cors: bool,
    enable_tracing: bool,
}

impl<I: Invoker> GatewayRouter<I> {
    /// Create a router builder for `gateway` with the default paths.
    pub fn new(gateway: Gateway<I>) -> Self {
        Self {
            gateway,
            rest_path: DEFAULT_REST_PATH.to_string(),
            ws_path: DEFAULT_WS_PATH.to_string(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            ws_idle_timeout: None,
            enable_cors: false,
            enable_tracing: false,
        }
    }

    /// Create a router builder with paths and limits taken from `config`.
    pub fn from_config(config: &GatewayConfig, gateway: Gateway<I>) -> Self {
        Self::new(gateway)
            .rest_path(config.rest_path.clone())
            .ws_path(config.ws_path.clone())
            .max_message_size(config.max_message_size)
            .ws_idle_timeout(config.ws_idle_timeout())
    }

    /// Set the REST endpoint path.
    #[must_use]
    pub fn rest_path(mut self, path: impl Into<String>) -> Self {
        self.rest_path = path.into();
        self
    }

    /// Set the WebSocket endpoint path.
    #[must_use]
    pub fn ws_path(mut self, path: impl Into<String>) -> Self {
        self.ws_path = path.into();
        self
    }

    /// Set the largest accepted REST body or WebSocket message.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Close WebSocket connections that stay silent this long.
    #[must_use]
    pub const fn ws_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ws_idle_timeout = timeout;
        self
    }

    /// Enable CORS with permissive defaults.
    #[must_use]
    pub const fn with_cors(mut self) -> Self {
        self.enable_cors = true;
        self
    }

    /// Enable request tracing.
    #[must_use]
    pub const fn with_tracing(mut self) -> Self {
        self.enable_tracing = true;
        self
    }

    /// Build the router.
    ///
    /// # Panics
    ///
    /// Panics if an endpoint path is not a literal absolute path or clashes
    /// with another route. Paths from a config that passed
    /// [`GatewayConfig::validate`] never do.
    #[must_use]
    pub fn into_router(self) -> Router {
        let state = GatewayState::new(
            self.gateway,
            WsSettings {
                max_message_size: self.max_message_size,
                idle_timeout: self.ws_idle_timeout,
            },
        );

        let mut router = Router::new()
            .route(&self.rest_path, post(handle_rest::<I>))
            .route(&self.ws_path, get(handle_ws::<I>))
            .route(HEALTH_PATH, get(handle_health))
            .layer(DefaultBodyLimit::max(self.max_message_size))
            .with_state(state);

        if self.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
pub async fn serve_http(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let local = listener.local_addr().ok();
    info!(addr = ?local, "Starting HTTP listener");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!(addr = ?local, "HTTP listener stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use gatekit_core::{EnvelopeReply, EnvelopeRequest, InvokeError, RoutingTable};
    use gatekit_testing::MockInvoker;
    use tower::ServiceExt;

    use super::*;

    const SLOW: u32 = 1500;

    /// Echoes every command except [`SLOW`], which times out.
    fn invoker() -> MockInvoker {
        MockInvoker::builder()
            .fail(
                SLOW,
                InvokeError::Timeout {
                    timeout: Duration::from_secs(1),
                },
            )
            .build()
    }

    fn router_with(invoker: MockInvoker) -> Router {
        let routes = RoutingTable::builder()
            .route(1000..2000, "http://backend:1", "svc/Call")
            .build()
            .unwrap();
        GatewayRouter::new(Gateway::new(routes, invoker))
            .max_message_size(1024)
            .into_router()
    }

    fn router() -> Router {
        router_with(invoker())
    }

    fn post_envelope(body: impl Into<Body>) -> Request<Body> {
        Request::post(DEFAULT_REST_PATH)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rest_round_trip() {
        let invoker = invoker();
        let request = EnvelopeRequest::new(1000, b"{\"name\":\"rest req\"}".to_vec())
            .with_requester_id("uid123");
        let response = router_with(invoker.clone())
            .oneshot(post_envelope(request.encode_json().unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let reply = EnvelopeReply::decode_json(&bytes).unwrap();
        assert_eq!(reply, EnvelopeReply::new(1000, b"{\"name\":\"rest req\"}".to_vec()));

        let calls = invoker.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].request, request);
        assert_eq!(calls[0].route.backend_address, "http://backend:1");
    }

    #[tokio::test]
    async fn test_rest_malformed_never_reaches_backend() {
        let invoker = invoker();
        let response = router_with(invoker.clone())
            .oneshot(post_envelope("not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invoker.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rest_malformed_is_400() {
        let response = router()
            .oneshot(post_envelope("{\"header\":"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_rest_unroutable_is_500() {
        let request = EnvelopeRequest::new(9999, Vec::new());
        let response = router()
            .oneshot(post_envelope(request.encode_json().unwrap()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "unroutable command 9999");
    }

    #[tokio::test]
    async fn test_rest_timeout_is_500() {
        let request = EnvelopeRequest::new(SLOW, Vec::new());
        let response = router()
            .oneshot(post_envelope(request.encode_json().unwrap()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("timeout"), "{message}");
    }

    #[tokio::test]
    async fn test_rest_body_limit() {
        let request = EnvelopeRequest::new(1000, vec![b'a'; 4096]);
        let response = router()
            .oneshot(post_envelope(request.encode_json().unwrap()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_rest_requires_post() {
        let response = router()
            .oneshot(
                Request::get(DEFAULT_REST_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[test]
    fn test_router_builder() {
        let routes = RoutingTable::default();
        let router = GatewayRouter::new(Gateway::new(routes, MockInvoker::new()))
            .rest_path("/api/envelope")
            .ws_path("/api/ws")
            .ws_idle_timeout(Some(Duration::from_secs(30)))
            .with_cors()
            .with_tracing()
            .into_router();

        // Router should be created without panicking
        let _ = router;
    }
}
