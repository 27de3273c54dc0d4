//! The backend invoker seam.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::envelope::{EnvelopeReply, EnvelopeRequest};
use crate::error::InvokeError;
use crate::routing::RouteEntry;

/// Performs the network call from the gateway to a resolved backend.
///
/// One call to [`invoke`](Invoker::invoke) is one outbound request: no
/// retries, no caching. Implementations must give up once `timeout` has
/// elapsed and report [`InvokeError::Timeout`].
///
/// The production implementation dials the backend over gRPC; tests plug in
/// an in-process dispatcher or a mock.
///
/// # Example Implementation
///
/// ```ignore
/// struct Echo;
///
/// impl Invoker for Echo {
///     fn invoke(
///         &self,
///         _route: &RouteEntry,
///         request: &EnvelopeRequest,
///         _timeout: Duration,
///     ) -> impl Future<Output = Result<EnvelopeReply, InvokeError>> + Send {
///         let reply = request.reply(request.payload.clone());
///         async move { Ok(reply) }
///     }
/// }
/// ```
pub trait Invoker: Send + Sync + 'static {
    /// Forward `request` unchanged to `route` and return the backend's reply.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Timeout`] when the deadline elapses,
    /// [`InvokeError::Unreachable`] when the backend cannot be dialed, and
    /// [`InvokeError::BackendRejected`] when it answers with an error.
    fn invoke(
        &self,
        route: &RouteEntry,
        request: &EnvelopeRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<EnvelopeReply, InvokeError>> + Send;
}

impl<I: Invoker> Invoker for Arc<I> {
    fn invoke(
        &self,
        route: &RouteEntry,
        request: &EnvelopeRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<EnvelopeReply, InvokeError>> + Send {
        (**self).invoke(route, request, timeout)
    }
}
