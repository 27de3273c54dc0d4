//! Invokers for tests that do not need a network.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use gatekit_core::{EnvelopeReply, EnvelopeRequest, InvokeError, Invoker, RouteEntry};
use gatekit_server::{Dispatcher, status_from_dispatch_error};

/// A call seen by a [`MockInvoker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The route the gateway resolved.
    pub route: RouteEntry,
    /// The request exactly as forwarded.
    pub request: EnvelopeRequest,
    /// The deadline passed to the invoker.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
enum MockResponse {
    Reply(Vec<u8>),
    Fail(InvokeError),
}

/// A scripted invoker that records every call.
///
/// Commands without a scripted response echo their payload back.
///
/// # Example
///
/// ```rust
/// use gatekit_testing::MockInvoker;
/// use gatekit_core::InvokeError;
/// use std::time::Duration;
///
/// let invoker = MockInvoker::builder()
///     .reply(1000, b"hello".to_vec())
///     .fail(1001, InvokeError::Timeout { timeout: Duration::from_secs(1) })
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockInvoker {
    responses: Arc<HashMap<u32, MockResponse>>,
    delay: Option<Duration>,
    delays: Arc<HashMap<u32, Duration>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockInvoker {
    /// Create an echoing invoker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> MockInvokerBuilder {
        MockInvokerBuilder::default()
    }

    /// All calls seen so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls seen so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Invoker for MockInvoker {
    fn invoke(
        &self,
        route: &RouteEntry,
        request: &EnvelopeRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<EnvelopeReply, InvokeError>> + Send {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                route: route.clone(),
                request: request.clone(),
                timeout,
            });

        let result = match self.responses.get(&request.command()) {
            Some(MockResponse::Reply(payload)) => Ok(request.reply(payload.clone())),
            Some(MockResponse::Fail(err)) => Err(err.clone()),
            None => Ok(request.reply(request.payload.clone())),
        };
        let delay = self
            .delays
            .get(&request.command())
            .copied()
            .or(self.delay);

        async move {
            if let Some(delay) = delay {
                if delay >= timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(InvokeError::Timeout { timeout });
                }
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

/// Builder for [`MockInvoker`].
#[derive(Debug, Default)]
pub struct MockInvokerBuilder {
    responses: HashMap<u32, MockResponse>,
    delay: Option<Duration>,
    delays: HashMap<u32, Duration>,
}

impl MockInvokerBuilder {
    /// Answer `command` with `payload`.
    pub fn reply(mut self, command: u32, payload: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(command, MockResponse::Reply(payload.into()));
        self
    }

    /// Fail `command` with `err`.
    pub fn fail(mut self, command: u32, err: InvokeError) -> Self {
        self.responses.insert(command, MockResponse::Fail(err));
        self
    }

    /// Wait this long before every reply. Delays at or past the caller's
    /// deadline produce [`InvokeError::Timeout`].
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait `delay` before answering `command`, overriding [`delay`](Self::delay).
    pub fn delay_for(mut self, command: u32, delay: Duration) -> Self {
        self.delays.insert(command, delay);
        self
    }

    /// Build the invoker.
    #[must_use]
    pub fn build(self) -> MockInvoker {
        MockInvoker {
            responses: Arc::new(self.responses),
            delay: self.delay,
            delays: Arc::new(self.delays),
            calls: Arc::default(),
        }
    }
}

/// Calls a [`Dispatcher`] in-process instead of over the network.
///
/// Dispatch failures surface as [`InvokeError::BackendRejected`] with the
/// same status code a remote backend would send.
#[derive(Debug, Clone)]
pub struct DispatcherInvoker {
    dispatcher: Arc<Dispatcher>,
}

impl DispatcherInvoker {
    /// Wrap a dispatcher.
    pub fn new(dispatcher: impl Into<Arc<Dispatcher>>) -> Self {
        Self {
            dispatcher: dispatcher.into(),
        }
    }
}

impl Invoker for DispatcherInvoker {
    fn invoke(
        &self,
        _route: &RouteEntry,
        request: &EnvelopeRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<EnvelopeReply, InvokeError>> + Send {
        let dispatcher = Arc::clone(&self.dispatcher);
        let request = request.clone();
        async move {
            match tokio::time::timeout(timeout, dispatcher.dispatch(request)).await {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(err)) => {
                    let status = status_from_dispatch_error(&err);
                    Err(InvokeError::BackendRejected {
                        code: status.code() as i32,
                        message: status.message().to_string(),
                    })
                }
                Err(_) => Err(InvokeError::Timeout { timeout }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekit_core::{CommandRange, Encoding};
    use gatekit_server::greeter_dispatcher;
    use pretty_assertions::assert_eq;

    use crate::fixtures::{greeting, hello_request};

    fn route() -> RouteEntry {
        RouteEntry::new(CommandRange::new(1000, 2000).unwrap(), "http://mock", "svc/Call")
    }

    #[tokio::test]
    async fn test_mock_scripted_and_echo() {
        let invoker = MockInvoker::builder()
            .reply(1000, b"scripted".to_vec())
            .fail(1001, InvokeError::unreachable("http://mock", "refused"))
            .build();
        let timeout = Duration::from_secs(1);

        let reply = invoker
            .invoke(&route(), &EnvelopeRequest::new(1000, b"in".to_vec()), timeout)
            .await
            .unwrap();
        assert_eq!(&reply.payload[..], b"scripted");

        let err = invoker
            .invoke(&route(), &EnvelopeRequest::new(1001, Vec::new()), timeout)
            .await
            .unwrap_err();
        assert_eq!(err, InvokeError::unreachable("http://mock", "refused"));

        let reply = invoker
            .invoke(&route(), &EnvelopeRequest::new(1002, b"echo".to_vec()), timeout)
            .await
            .unwrap();
        assert_eq!(&reply.payload[..], b"echo");

        let calls = invoker.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].request.command(), 1002);
        assert_eq!(calls[2].timeout, timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_delay_past_deadline() {
        let invoker = MockInvoker::builder()
            .delay(Duration::from_secs(10))
            .build();
        let timeout = Duration::from_millis(100);
        let err = invoker
            .invoke(&route(), &EnvelopeRequest::new(1000, Vec::new()), timeout)
            .await
            .unwrap_err();
        assert_eq!(err, InvokeError::Timeout { timeout });
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_delay_per_command() {
        let invoker = MockInvoker::builder()
            .delay(Duration::from_millis(50))
            .delay_for(1001, Duration::from_millis(500))
            .build();
        let timeout = Duration::from_secs(1);

        let started = tokio::time::Instant::now();
        invoker
            .invoke(&route(), &EnvelopeRequest::new(1000, Vec::new()), timeout)
            .await
            .unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50) && elapsed < Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        invoker
            .invoke(&route(), &EnvelopeRequest::new(1001, Vec::new()), timeout)
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_dispatcher_invoker() {
        let invoker = DispatcherInvoker::new(greeter_dispatcher());
        let reply = invoker
            .invoke(
                &route(),
                &hello_request(Encoding::Json, "local"),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(greeting(&reply, Encoding::Json), "local");

        let err = invoker
            .invoke(
                &route(),
                &EnvelopeRequest::new(1999, Vec::new()),
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InvokeError::BackendRejected {
                code: 12,
                message: "unknown command 1999".to_string(),
            }
        );
    }
}
