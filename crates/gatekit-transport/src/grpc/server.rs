//! The gRPC gateway adapter and listener.

use std::time::Duration;

use gatekit_core::config::{DEFAULT_GRPC_ADDR, DEFAULT_MAX_MESSAGE_SIZE};
use gatekit_core::{EnvelopeRequest, Gateway, GatewayError, Invoker, wire};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use crate::error::{GrpcError, status_from_gateway_error};
use crate::proto::gateway::envelope_gateway_server::{EnvelopeGateway, EnvelopeGatewayServer};

/// Replies buffered per stream before the handler waits for the client.
pub const STREAM_BUFFER: usize = 32;

/// Configuration for a gRPC listener.
#[derive(Debug, Clone)]
pub struct GrpcServerConfig {
    /// Bind address (e.g., "0.0.0.0:50051").
    pub addr: String,
    /// Largest message accepted or sent, in bytes.
    pub max_message_size: usize,
    /// Maximum concurrent streams per connection.
    pub max_concurrent_streams: Option<u32>,
    /// HTTP/2 keepalive interval.
    pub http2_keepalive_interval: Option<Duration>,
}

impl GrpcServerConfig {
    /// Create a new server configuration with the given bind address.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_concurrent_streams: Some(200),
            http2_keepalive_interval: Some(Duration::from_secs(30)),
        }
    }

    /// Set the largest message accepted or sent.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set maximum concurrent streams per connection.
    #[must_use]
    pub const fn max_concurrent_streams(mut self, max: u32) -> Self {
        self.max_concurrent_streams = Some(max);
        self
    }

    /// Set HTTP/2 keepalive interval.
    #[must_use]
    pub const fn http2_keepalive_interval(mut self, interval: Duration) -> Self {
        self.http2_keepalive_interval = Some(interval);
        self
    }
}

impl Default for GrpcServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GRPC_ADDR)
    }
}

/// Serves `gatekit.gateway.EnvelopeGateway` on top of a [`Gateway`].
pub struct GatewayGrpcService<I> {
    gateway: Gateway<I>,
}

impl<I: Invoker> GatewayGrpcService<I> {
    /// Wrap a gateway.
    pub const fn new(gateway: Gateway<I>) -> Self {
        Self { gateway }
    }

    /// Wrap into the tonic service with the configured message limits.
    pub fn into_server(self, config: &GrpcServerConfig) -> EnvelopeGatewayServer<Self> {
        EnvelopeGatewayServer::new(self)
            .max_decoding_message_size(config.max_message_size)
            .max_encoding_message_size(config.max_message_size)
    }
}

async fn handle_one<I: Invoker>(
    gateway: &Gateway<I>,
    message: wire::EnvelopeRequest,
) -> Result<wire::EnvelopeReply, GatewayError> {
    let request = EnvelopeRequest::try_from(message)?;
    let reply = gateway.handle(request).await?;
    Ok(reply.into())
}

#[tonic::async_trait]
impl<I: Invoker> EnvelopeGateway for GatewayGrpcService<I> {
    async fn handle_envelope(
        &self,
        request: Request<wire::EnvelopeRequest>,
    ) -> Result<Response<wire::EnvelopeReply>, Status> {
        match handle_one(&self.gateway, request.into_inner()).await {
            Ok(reply) => Ok(Response::new(reply)),
            Err(err) => {
                warn!(error = %err, transport = "grpc", "Request failed");
                Err(status_from_gateway_error(&err))
            }
        }
    }

    type HandleEnvelopeStreamStream = ReceiverStream<Result<wire::EnvelopeReply, Status>>;

    async fn handle_envelope_stream(
        &self,
        request: Request<Streaming<wire::EnvelopeRequest>>,
    ) -> Result<Response<Self::HandleEnvelopeStreamStream>, Status> {
        let remote = request
            .remote_addr()
            .map_or_else(|| "unknown".to_string(), |a| a.to_string());
        debug!(remote = %remote, "Envelope stream opened");

        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let gateway = self.gateway.clone();

        // One request at a time keeps replies in arrival order.
        tokio::spawn(async move {
            loop {
                let message = match inbound.message().await {
                    Ok(Some(message)) => message,
                    Ok(None) => break,
                    Err(status) => {
                        debug!(remote = %remote, error = %status, "Envelope stream read failed");
                        break;
                    }
                };

                match handle_one(&gateway, message).await {
                    Ok(reply) => {
                        if tx.send(Ok(reply)).await.is_err() {
                            debug!(remote = %remote, "Client dropped envelope stream");
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(remote = %remote, error = %err, transport = "grpc-stream", "Request failed");
                        let _ = tx.send(Err(status_from_gateway_error(&err))).await;
                        break;
                    }
                }
            }
            debug!(remote = %remote, "Envelope stream closed");
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// Bind a listener. Failure here is fatal for the process.
pub async fn bind(addr: &str) -> Result<TcpListener, GrpcError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| GrpcError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// A tonic server builder with the configured HTTP/2 settings.
#[must_use]
pub fn server_builder(config: &GrpcServerConfig) -> Server {
    Server::builder()
        .max_concurrent_streams(config.max_concurrent_streams)
        .http2_keepalive_interval(config.http2_keepalive_interval)
}

/// Serve the gateway on `listener` until `shutdown` is cancelled.
///
/// In-flight calls are drained before this returns.
pub async fn serve_gateway<I: Invoker>(
    listener: TcpListener,
    gateway: Gateway<I>,
    config: &GrpcServerConfig,
    shutdown: CancellationToken,
) -> Result<(), GrpcError> {
    let local = listener.local_addr().ok();
    info!(addr = ?local, "Starting gRPC gateway listener");

    let service = GatewayGrpcService::new(gateway).into_server(config);
    server_builder(config)
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            shutdown.cancelled().await;
        })
        .await?;

    info!(addr = ?local, "gRPC gateway listener stopped");
    Ok(())
}
