//! The resolve-then-invoke pipeline shared by every transport adapter.

use std::sync::Arc;
use std::time::Duration;

use crate::envelope::{EnvelopeReply, EnvelopeRequest};
use crate::error::GatewayError;
use crate::invoke::Invoker;
use crate::routing::RoutingTable;

/// Default per-call backend deadline.
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Routes envelopes to backends.
///
/// Adapters decode their native request into an [`EnvelopeRequest`], call
/// [`handle`](Gateway::handle), and translate the result back. The gateway
/// holds no per-connection state, so one instance is cloned into every
/// adapter and connection task.
pub struct Gateway<I> {
    routes: Arc<RoutingTable>,
    invoker: Arc<I>,
    timeout: Duration,
}

impl<I> Clone for Gateway<I> {
    fn clone(&self) -> Self {
        Self {
            routes: Arc::clone(&self.routes),
            invoker: Arc::clone(&self.invoker),
            timeout: self.timeout,
        }
    }
}

impl<I> std::fmt::Debug for Gateway<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("routes", &self.routes.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<I: Invoker> Gateway<I> {
    /// Create a gateway with the default invoke timeout.
    pub fn new(routes: impl Into<Arc<RoutingTable>>, invoker: I) -> Self {
        Self {
            routes: routes.into(),
            invoker: Arc::new(invoker),
            timeout: DEFAULT_INVOKE_TIMEOUT,
        }
    }

    /// Set the per-call backend deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the request's command and forward it to the owning backend.
    ///
    /// The envelope is passed through untouched; only `header.command` is
    /// inspected.
    #[tracing::instrument(
        name = "gateway.handle",
        skip_all,
        fields(command = request.header.command, requester_id = %request.header.requester_id)
    )]
    pub async fn handle(&self, request: EnvelopeRequest) -> Result<EnvelopeReply, GatewayError> {
        let route = self.routes.resolve(request.header.command)?;
        tracing::debug!(
            backend = %route.backend_address,
            interface = %route.backend_interface,
            "Forwarding envelope"
        );

        let reply = self.invoker.invoke(route, &request, self.timeout).await?;
        Ok(reply)
    }

    /// The routing table.
    #[must_use]
    pub fn routes(&self) -> &Arc<RoutingTable> {
        &self.routes
    }

    /// The backend invoker.
    #[must_use]
    pub fn invoker(&self) -> &Arc<I> {
        &self.invoker
    }

    /// The per-call backend deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}
