//! Testing utilities for gatekit.
//!
//! - [`MockInvoker`]: a scripted invoker that records every call
//! - [`DispatcherInvoker`]: runs a backend dispatcher in-process
//! - [`TestBackend`] and [`TestGateway`]: live servers on ephemeral ports
//! - [`fixtures`]: Greeter envelopes and routing tables
//!
//! # Example
//!
//! ```rust,ignore
//! use gatekit_testing::{TestBackend, TestGateway, fixtures};
//! use gatekit_server::greeter_dispatcher;
//! use std::time::Duration;
//!
//! #[tokio::test]
//! async fn greets_over_rest() {
//!     let backend = TestBackend::spawn(greeter_dispatcher()).await;
//!     let gateway = TestGateway::spawn(
//!         fixtures::greeter_routes(backend.addr),
//!         Duration::from_secs(1),
//!     )
//!     .await;
//!     // POST to gateway.rest_url() ...
//! }
//! ```

#![deny(missing_docs)]

pub mod async_helpers;
pub mod fixtures;
pub mod harness;
pub mod mock;

pub use async_helpers::{DEFAULT_TIMEOUT, assert_still_pending, with_default_timeout, with_timeout};
pub use harness::{TestBackend, TestGateway};
pub use mock::{DispatcherInvoker, MockInvoker, MockInvokerBuilder, RecordedCall};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::async_helpers::{assert_still_pending, with_default_timeout, with_timeout};
    pub use crate::fixtures::{greeter_routes, greeting, hello_request};
    pub use crate::harness::{TestBackend, TestGateway};
    pub use crate::mock::{DispatcherInvoker, MockInvoker};
}
