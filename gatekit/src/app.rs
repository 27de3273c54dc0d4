//! Process assembly: bind every listener, then serve under a supervisor.
//!
//! Binding happens before anything is spawned, so a port that cannot be
//! bound fails startup instead of leaving a half-running process.

use std::future::Future;
use std::net::SocketAddr;

use gatekit_axum::{GatewayRouter, serve_http};
use gatekit_core::{Gateway, GatewayConfig, RoutingTable};
use gatekit_server::{Dispatcher, serve_backend};
use gatekit_transport::grpc::{self, GrpcServerConfig, serve_gateway};
use gatekit_transport::{GrpcError, GrpcInvoker};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::ServeError;
use crate::supervisor::Supervisor;

fn local_addr(listener: &TcpListener, requested: &str) -> Result<SocketAddr, GrpcError> {
    listener.local_addr().map_err(|source| GrpcError::Bind {
        addr: requested.to_string(),
        source,
    })
}

/// A gateway with its gRPC and HTTP listeners bound.
#[derive(Debug)]
pub struct GatewayApp {
    config: GatewayConfig,
    routes: RoutingTable,
    grpc: TcpListener,
    http: TcpListener,
    grpc_addr: SocketAddr,
    http_addr: SocketAddr,
}

impl GatewayApp {
    /// Validate `config` and bind both listeners.
    pub async fn bind(config: GatewayConfig) -> Result<Self, ServeError> {
        config.validate()?;
        let routes = config.routing_table()?;

        let grpc = grpc::bind(&config.grpc_addr).await?;
        let grpc_addr = local_addr(&grpc, &config.grpc_addr)?;

        let requested = config.http_socket_addr()?;
        let http = TcpListener::bind(requested)
            .await
            .map_err(|source| ServeError::HttpBind {
                addr: requested,
                source,
            })?;
        let http_addr = http.local_addr().map_err(|source| ServeError::HttpBind {
            addr: requested,
            source,
        })?;

        Ok(Self {
            config,
            routes,
            grpc,
            http,
            grpc_addr,
            http_addr,
        })
    }

    /// Where the gRPC adapter listens.
    #[must_use]
    pub const fn grpc_addr(&self) -> SocketAddr {
        self.grpc_addr
    }

    /// Where the REST and WebSocket adapters listen.
    #[must_use]
    pub const fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Serve until `signal` fires or a listener fails.
    pub async fn run_until<S>(self, signal: S) -> Result<(), ServeError>
    where
        S: Future<Output = ()>,
    {
        let Self {
            config,
            routes,
            grpc,
            http,
            grpc_addr,
            http_addr,
        } = self;

        info!(
            %grpc_addr,
            %http_addr,
            routes = routes.len(),
            timeout_ms = config.invoke_timeout_ms,
            "Gateway starting"
        );

        let invoker = GrpcInvoker::new().max_message_size(config.max_message_size);
        let gateway = Gateway::new(routes, invoker).with_timeout(config.invoke_timeout());
        let grpc_config =
            GrpcServerConfig::new(&config.grpc_addr).max_message_size(config.max_message_size);
        let router = GatewayRouter::from_config(&config, gateway.clone())
            .with_tracing()
            .into_router();

        let mut supervisor = Supervisor::new();
        let token = supervisor.token();
        supervisor.spawn("grpc", async move {
            serve_gateway(grpc, gateway, &grpc_config, token)
                .await
                .map_err(ServeError::from)
        });
        let token = supervisor.token();
        supervisor.spawn("http", async move {
            serve_http(http, router, token)
                .await
                .map_err(ServeError::Http)
        });

        supervisor.run_until(signal).await
    }
}

/// A backend with its gRPC listener bound.
#[derive(Debug)]
pub struct BackendApp {
    dispatcher: Dispatcher,
    config: GrpcServerConfig,
    listener: TcpListener,
    addr: SocketAddr,
}

impl BackendApp {
    /// Bind `addr` for serving `dispatcher`.
    pub async fn bind(addr: &str, dispatcher: Dispatcher) -> Result<Self, ServeError> {
        let config = GrpcServerConfig::new(addr);
        let listener = grpc::bind(&config.addr).await?;
        let addr = local_addr(&listener, &config.addr)?;
        Ok(Self {
            dispatcher,
            config,
            listener,
            addr,
        })
    }

    /// Where the backend listens.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `signal` fires or the listener fails.
    pub async fn run_until<S>(self, signal: S) -> Result<(), ServeError>
    where
        S: Future<Output = ()>,
    {
        let Self {
            dispatcher,
            config,
            listener,
            addr,
        } = self;
        info!(%addr, commands = dispatcher.len(), "Backend starting");

        let mut supervisor = Supervisor::new();
        let token = supervisor.token();
        supervisor.spawn("backend", async move {
            serve_backend(listener, dispatcher, &config, token)
                .await
                .map_err(ServeError::from)
        });
        supervisor.run_until(signal).await
    }
}
