//! Mapping between gateway errors and gRPC status codes.

use std::time::Duration;

use gatekit_core::{GatewayError, InvokeError, RoutingError};
use thiserror::Error;
use tonic::{Code, Status};

/// gRPC listener errors. These are fatal for the listener that raised them.
#[derive(Debug, Error)]
pub enum GrpcError {
    /// Binding the listen address failed.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tonic server failed.
    #[error("gRPC server error: {0}")]
    Server(#[from] tonic::transport::Error),
}

/// Translate a pipeline failure into the status returned to a gRPC caller.
///
/// Backend rejections keep the backend's own code so callers see what the
/// backend said.
#[must_use]
pub fn status_from_gateway_error(err: &GatewayError) -> Status {
    let message = err.to_string();
    match err {
        GatewayError::Decode(_) => Status::invalid_argument(message),
        GatewayError::Routing(RoutingError::Unroutable { .. }) => Status::not_found(message),
        GatewayError::Routing(_) => Status::internal(message),
        GatewayError::Invoke(InvokeError::Timeout { .. }) => Status::deadline_exceeded(message),
        GatewayError::Invoke(InvokeError::Unreachable { .. }) => Status::unavailable(message),
        GatewayError::Invoke(InvokeError::BackendRejected { code, message }) => {
            Status::new(Code::from(*code), message.clone())
        }
    }
}

/// Classify a status returned by a backend call.
#[must_use]
pub fn invoke_error_from_status(address: &str, status: &Status, timeout: Duration) -> InvokeError {
    match status.code() {
        Code::DeadlineExceeded => InvokeError::Timeout { timeout },
        Code::Unavailable => InvokeError::unreachable(address, status.message()),
        code => InvokeError::BackendRejected {
            code: code as i32,
            message: status.message().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekit_core::DecodeError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (GatewayError::from(DecodeError::MissingHeader), Code::InvalidArgument),
            (
                GatewayError::from(RoutingError::Unroutable { command: 9999 }),
                Code::NotFound,
            ),
            (
                GatewayError::from(InvokeError::Timeout {
                    timeout: Duration::from_secs(1),
                }),
                Code::DeadlineExceeded,
            ),
            (
                GatewayError::from(InvokeError::unreachable("http://x:1", "refused")),
                Code::Unavailable,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(status_from_gateway_error(&err).code(), code, "{err}");
        }
    }

    #[test]
    fn test_backend_rejection_keeps_code() {
        let err = GatewayError::from(InvokeError::BackendRejected {
            code: Code::Unimplemented as i32,
            message: "unknown command 1999".to_string(),
        });
        let status = status_from_gateway_error(&err);
        assert_eq!(status.code(), Code::Unimplemented);
        assert_eq!(status.message(), "unknown command 1999");
    }

    #[test]
    fn test_unroutable_message_names_command() {
        let status =
            status_from_gateway_error(&RoutingError::Unroutable { command: 9999 }.into());
        assert!(status.message().contains("9999"));
    }

    #[test]
    fn test_backend_status_classification() {
        let timeout = Duration::from_millis(200);
        assert_eq!(
            invoke_error_from_status("http://b:1", &Status::deadline_exceeded("slow"), timeout),
            InvokeError::Timeout { timeout }
        );
        assert_eq!(
            invoke_error_from_status("http://b:1", &Status::unavailable("down"), timeout),
            InvokeError::unreachable("http://b:1", "down")
        );
        assert_eq!(
            invoke_error_from_status("http://b:1", &Status::internal("boom"), timeout),
            InvokeError::BackendRejected {
                code: Code::Internal as i32,
                message: "boom".to_string(),
            }
        );
    }
}
