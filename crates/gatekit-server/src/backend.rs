//! Hosting a [`Dispatcher`] as a gRPC backend.

use std::sync::Arc;

use gatekit_core::{EnvelopeRequest, wire};
use gatekit_transport::grpc::{GrpcServerConfig, server_builder};
use gatekit_transport::proto::backend::envelope_backend_server::{
    EnvelopeBackend, EnvelopeBackendServer,
};
use gatekit_transport::GrpcError;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use crate::dispatcher::{DispatchError, Dispatcher};
use crate::greeter::GreeterService;
use crate::proto::greeter_server::GreeterServer;

/// Serves `gatekit.backend.EnvelopeBackend` by dispatching each envelope.
#[derive(Debug, Clone)]
pub struct BackendService {
    dispatcher: Arc<Dispatcher>,
}

impl BackendService {
    /// Wrap a dispatcher.
    pub fn new(dispatcher: impl Into<Arc<Dispatcher>>) -> Self {
        Self {
            dispatcher: dispatcher.into(),
        }
    }

    /// Wrap into the tonic service with the configured message limits.
    pub fn into_server(self, config: &GrpcServerConfig) -> EnvelopeBackendServer<Self> {
        EnvelopeBackendServer::new(self)
            .max_decoding_message_size(config.max_message_size)
            .max_encoding_message_size(config.max_message_size)
    }
}

/// The status a caller sees for a dispatch failure.
#[must_use]
pub fn status_from_dispatch_error(err: &DispatchError) -> Status {
    let message = err.to_string();
    match err {
        DispatchError::UnknownCommand { .. } => Status::unimplemented(message),
        DispatchError::Decode(_) => Status::invalid_argument(message),
        DispatchError::Encode(_) | DispatchError::Handler(_) => Status::internal(message),
    }
}

#[tonic::async_trait]
impl EnvelopeBackend for BackendService {
    async fn handle_envelope(
        &self,
        request: Request<wire::EnvelopeRequest>,
    ) -> Result<Response<wire::EnvelopeReply>, Status> {
        let request = EnvelopeRequest::try_from(request.into_inner())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;

        match self.dispatcher.dispatch(request).await {
            Ok(reply) => Ok(Response::new(reply.into())),
            Err(err) => {
                warn!(error = %err, "Dispatch failed");
                Err(status_from_dispatch_error(&err))
            }
        }
    }
}

/// Serve `dispatcher` on `listener` until `shutdown` is cancelled.
///
/// The typed `gatekit.greeter.Greeter` service is mounted alongside the
/// envelope backend.
pub async fn serve_backend(
    listener: TcpListener,
    dispatcher: impl Into<Arc<Dispatcher>>,
    config: &GrpcServerConfig,
    shutdown: CancellationToken,
) -> Result<(), GrpcError> {
    let local = listener.local_addr().ok();
    info!(addr = ?local, "Starting backend listener");

    server_builder(config)
        .add_service(BackendService::new(dispatcher).into_server(config))
        .add_service(GreeterServer::new(GreeterService))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            shutdown.cancelled().await;
        })
        .await?;

    info!(addr = ?local, "Backend listener stopped");
    Ok(())
}
