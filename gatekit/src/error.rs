//! Process-level errors.

use std::net::SocketAddr;

use gatekit_core::ConfigError;
use gatekit_transport::GrpcError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that stop a gateway or backend process.
#[derive(Error, Diagnostic, Debug)]
pub enum ServeError {
    /// The configuration is unusable.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// A gRPC listener could not be bound or failed while serving.
    #[error(transparent)]
    #[diagnostic(code(gatekit::grpc), help("Check that the port is free"))]
    Grpc(#[from] GrpcError),

    /// The HTTP listener address could not be bound.
    #[error("cannot bind HTTP listener on {addr}")]
    #[diagnostic(code(gatekit::http::bind), help("Check that the port is free"))]
    HttpBind {
        /// The address that was requested.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP listener failed while serving.
    #[error("HTTP listener failed")]
    #[diagnostic(code(gatekit::http))]
    Http(#[source] std::io::Error),

    /// A listener task panicked or was aborted.
    #[error("listener '{name}' stopped abnormally")]
    #[diagnostic(code(gatekit::supervisor))]
    TaskFailed {
        /// The listener's name.
        name: String,
    },

    /// The global log subscriber could not be installed.
    #[error("cannot initialize logging: {0}")]
    #[diagnostic(code(gatekit::logging))]
    Logging(String),
}
