//! Live servers on ephemeral ports.
//!
//! Each handle cancels its listeners when dropped.

use std::net::SocketAddr;
use std::time::Duration;

use gatekit_axum::{GatewayRouter, serve_http};
use gatekit_core::config::{DEFAULT_REST_PATH, DEFAULT_WS_PATH};
use gatekit_core::{Gateway, RoutingTable};
use gatekit_server::{Dispatcher, serve_backend};
use gatekit_transport::GrpcInvoker;
use gatekit_transport::grpc::{self, GrpcServerConfig, serve_gateway};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const LOCALHOST: &str = "127.0.0.1:0";

/// A backend serving a dispatcher over gRPC.
#[derive(Debug)]
pub struct TestBackend {
    /// Where the backend listens.
    pub addr: SocketAddr,
    token: CancellationToken,
}

impl TestBackend {
    /// Serve `dispatcher` on a fresh port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(dispatcher: Dispatcher) -> Self {
        let config = GrpcServerConfig::new(LOCALHOST);
        let listener = grpc::bind(&config.addr).await.expect("bind backend");
        let addr = listener.local_addr().expect("backend address");
        let token = CancellationToken::new();
        let shutdown = token.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_backend(listener, dispatcher, &config, shutdown).await {
                panic!("backend failed: {e}");
            }
        });
        Self { addr, token }
    }

    /// The URI a route entry should use for this backend.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// A gateway with all three adapters listening, backed by [`GrpcInvoker`].
#[derive(Debug)]
pub struct TestGateway {
    /// The gRPC listener.
    pub grpc_addr: SocketAddr,
    /// The HTTP listener carrying REST and WebSocket.
    pub http_addr: SocketAddr,
    /// REST endpoint path.
    pub rest_path: String,
    /// WebSocket endpoint path.
    pub ws_path: String,
    token: CancellationToken,
}

impl TestGateway {
    /// Start a gateway over `routes` with the given backend deadline.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(routes: RoutingTable, timeout: Duration) -> Self {
        let gateway = Gateway::new(routes, GrpcInvoker::new()).with_timeout(timeout);
        let token = CancellationToken::new();

        let config = GrpcServerConfig::new(LOCALHOST);
        let grpc_listener = grpc::bind(&config.addr).await.expect("bind gRPC");
        let grpc_addr = grpc_listener.local_addr().expect("gRPC address");
        let grpc_gateway = gateway.clone();
        let shutdown = token.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_gateway(grpc_listener, grpc_gateway, &config, shutdown).await {
                panic!("gRPC gateway failed: {e}");
            }
        });

        let router = GatewayRouter::new(gateway);
        let http_listener = TcpListener::bind(LOCALHOST).await.expect("bind HTTP");
        let http_addr = http_listener.local_addr().expect("HTTP address");
        let shutdown = token.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_http(http_listener, router.into_router(), shutdown).await {
                panic!("HTTP gateway failed: {e}");
            }
        });

        Self {
            grpc_addr,
            http_addr,
            rest_path: DEFAULT_REST_PATH.to_string(),
            ws_path: DEFAULT_WS_PATH.to_string(),
            token,
        }
    }

    /// URI for gRPC clients.
    #[must_use]
    pub fn grpc_uri(&self) -> String {
        format!("http://{}", self.grpc_addr)
    }

    /// URL of the REST endpoint.
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("http://{}{}", self.http_addr, self.rest_path)
    }

    /// URL of the WebSocket endpoint.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.http_addr, self.ws_path)
    }

    /// Stop all listeners.
    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
