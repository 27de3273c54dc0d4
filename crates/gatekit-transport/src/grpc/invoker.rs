//! Backend invoker over gRPC.

use std::future::Future;
use std::time::Duration;

use gatekit_core::config::DEFAULT_MAX_MESSAGE_SIZE;
use gatekit_core::{EnvelopeReply, EnvelopeRequest, InvokeError, Invoker, RouteEntry, wire};
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Endpoint;
use tracing::debug;

use crate::error::invoke_error_from_status;

/// Dials the routed backend for every call.
///
/// Each invocation opens its own channel, performs exactly one unary call to
/// the route's `backend_interface`, and drops the channel whether the call
/// succeeded, failed, or hit the deadline. Connect and call together are
/// bounded by the deadline passed to [`invoke`](Invoker::invoke).
#[derive(Debug, Clone)]
pub struct GrpcInvoker {
    max_message_size: usize,
}

impl GrpcInvoker {
    /// Create an invoker with the default message size limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Set the largest message sent to or accepted from a backend.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}

impl Default for GrpcInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl Invoker for GrpcInvoker {
    fn invoke(
        &self,
        route: &RouteEntry,
        request: &EnvelopeRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<EnvelopeReply, InvokeError>> + Send {
        let address = route.backend_address.clone();
        let path = route.method_path();
        let message = wire::EnvelopeRequest::from(request.clone());
        let max_message_size = self.max_message_size;

        async move {
            let call = unary_call(&address, &path, message, timeout, max_message_size);
            match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(backend = %address, ?timeout, "Backend call timed out");
                    Err(InvokeError::Timeout { timeout })
                }
            }
        }
    }
}

async fn unary_call(
    address: &str,
    path: &str,
    message: wire::EnvelopeRequest,
    timeout: Duration,
    max_message_size: usize,
) -> Result<EnvelopeReply, InvokeError> {
    let path: PathAndQuery = path
        .parse()
        .map_err(|e| InvokeError::unreachable(address, format!("invalid interface {path}: {e}")))?;

    let endpoint = Endpoint::from_shared(address.to_string())
        .map_err(|e| InvokeError::unreachable(address, e.to_string()))?
        .connect_timeout(timeout);

    let channel = endpoint
        .connect()
        .await
        .map_err(|e| InvokeError::unreachable(address, e.to_string()))?;

    let mut grpc = tonic::client::Grpc::new(channel)
        .max_decoding_message_size(max_message_size)
        .max_encoding_message_size(max_message_size);
    grpc.ready()
        .await
        .map_err(|e| InvokeError::unreachable(address, e.to_string()))?;

    let codec = ProstCodec::<wire::EnvelopeRequest, wire::EnvelopeReply>::default();
    let response = grpc
        .unary(tonic::Request::new(message), path, codec)
        .await
        .map_err(|status| invoke_error_from_status(address, &status, timeout))?;

    Ok(response.into_inner().into())
}
