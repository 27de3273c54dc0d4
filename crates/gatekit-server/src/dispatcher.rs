//! Command dispatch inside a backend service.
//!
//! A [`Dispatcher`] owns a map from command number to a typed handler. For
//! every envelope it:
//!
//! 1. selects the handler registered for `header.command`
//! 2. decodes the payload with `header.encoding`
//! 3. runs the handler
//! 4. re-encodes the result with the same encoding and echoes the command
//!
//! New capabilities are added only by registering handlers.
//!
//! # Example
//!
//! ```rust
//! use gatekit_server::dispatcher::{Dispatcher, HandlerError};
//! use gatekit_server::greeter::{HelloReply, HelloRequest};
//!
//! let dispatcher = Dispatcher::builder()
//!     .handler(1000, |req: HelloRequest| async move {
//!         Ok::<_, HandlerError>(HelloReply { message: req.name })
//!     })
//!     .build();
//!
//! assert!(dispatcher.contains(1000));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use gatekit_core::{DecodeError, EncodeError, EnvelopeReply, EnvelopeRequest, Payload};
use thiserror::Error;

/// The future returned by a registered handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<EnvelopeReply, DispatchError>> + Send>>;

/// A boxed async function serving one command.
pub type BoxedHandlerFn = Box<dyn Fn(EnvelopeRequest) -> HandlerFuture + Send + Sync>;

/// Failure reported by business logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the command.
    #[error("unknown command {command}")]
    UnknownCommand {
        /// The unhandled command.
        command: u32,
    },

    /// The payload did not decode as the handler's request type.
    #[error("cannot decode payload: {0}")]
    Decode(#[from] DecodeError),

    /// The handler's reply could not be encoded.
    #[error("cannot encode reply: {0}")]
    Encode(#[from] EncodeError),

    /// The handler failed.
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

/// Routes envelopes to the handler registered for their command.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<u32, BoxedHandlerFn>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Register a typed handler for `command`, replacing any previous one.
    pub fn register<Req, Resp, F, Fut>(&mut self, command: u32, handler: F)
    where
        Req: Payload + 'static,
        Resp: Payload + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
    {
        let boxed: BoxedHandlerFn = Box::new(move |request: EnvelopeRequest| -> HandlerFuture {
            let encoding = request.encoding();
            let command = request.command();
            let pending = encoding.decode::<Req>(&request.payload).map(&handler);
            Box::pin(async move {
                let output = pending?.await?;
                let payload = encoding.encode(&output)?;
                Ok(EnvelopeReply::new(command, payload))
            })
        });
        self.handlers.insert(command, boxed);
    }

    /// Whether a handler is registered for `command`.
    #[must_use]
    pub fn contains(&self, command: u32) -> bool {
        self.handlers.contains_key(&command)
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handle one envelope.
    pub async fn dispatch(&self, request: EnvelopeRequest) -> Result<EnvelopeReply, DispatchError> {
        let command = request.command();
        let handler = self
            .handlers
            .get(&command)
            .ok_or(DispatchError::UnknownCommand { command })?;

        tracing::debug!(
            command,
            requester_id = %request.header.requester_id,
            encoding = %request.encoding(),
            "Dispatching envelope"
        );
        handler(request).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<_> = self.handlers.keys().collect();
        commands.sort();
        f.debug_struct("Dispatcher")
            .field("commands", &commands)
            .finish()
    }
}

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    dispatcher: Dispatcher,
}

impl DispatcherBuilder {
    /// Register a typed handler for `command`.
    pub fn handler<Req, Resp, F, Fut>(mut self, command: u32, handler: F) -> Self
    where
        Req: Payload + 'static,
        Resp: Payload + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
    {
        self.dispatcher.register(command, handler);
        self
    }

    /// Build the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        self.dispatcher
    }
}
