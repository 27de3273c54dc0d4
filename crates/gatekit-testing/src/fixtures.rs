//! Envelope and routing fixtures.

use std::net::SocketAddr;
use std::time::Duration;

use gatekit_core::config::BACKEND_INTERFACE;
use gatekit_core::{Encoding, EnvelopeReply, EnvelopeRequest, RoutingTable};
use gatekit_server::greeter::say_hello;
use gatekit_server::{Dispatcher, HelloReply, HelloRequest, SAY_HELLO, greeter_dispatcher};

/// Requester id used by every fixture request.
pub const REQUESTER_ID: &str = "uid123";

/// Command answered only after a delay by [`slow_greeter_dispatcher`].
pub const SLOW_SAY_HELLO: u32 = 1500;

/// The Greeter dispatcher plus [`SLOW_SAY_HELLO`], which greets after `delay`.
#[must_use]
pub fn slow_greeter_dispatcher(delay: Duration) -> Dispatcher {
    let mut dispatcher = greeter_dispatcher();
    dispatcher.register(SLOW_SAY_HELLO, move |request: HelloRequest| async move {
        tokio::time::sleep(delay).await;
        say_hello(request).await
    });
    dispatcher
}

/// A `SayHello` envelope for `name` with its payload in `encoding`.
///
/// # Panics
///
/// Panics if the payload cannot be encoded.
#[must_use]
pub fn hello_request(encoding: Encoding, name: &str) -> EnvelopeRequest {
    let payload = encoding
        .encode(&HelloRequest {
            name: name.to_string(),
        })
        .expect("HelloRequest encodes");
    EnvelopeRequest::new(SAY_HELLO, payload)
        .with_requester_id(REQUESTER_ID)
        .with_encoding(encoding)
}

/// Decode the greeting from a `SayHello` reply.
///
/// # Panics
///
/// Panics if the reply is for another command or the payload is not a
/// `HelloReply` in `encoding`.
#[must_use]
pub fn greeting(reply: &EnvelopeReply, encoding: Encoding) -> String {
    assert_eq!(reply.command, SAY_HELLO, "reply is for another command");
    let reply: HelloReply = encoding
        .decode(&reply.payload)
        .expect("payload is a HelloReply");
    reply.message
}

/// A table sending `[1000, 2000)` to the envelope backend at `backend`.
///
/// # Panics
///
/// Panics if the table is rejected, which it never is.
#[must_use]
pub fn greeter_routes(backend: SocketAddr) -> RoutingTable {
    RoutingTable::builder()
        .route(1000..2000, format!("http://{backend}"), BACKEND_INTERFACE)
        .build()
        .expect("single route table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hello_request() {
        let request = hello_request(Encoding::Json, "rest req");
        assert_eq!(request.command(), SAY_HELLO);
        assert_eq!(request.encoding(), Encoding::Json);
        assert_eq!(request.header.requester_id, REQUESTER_ID);
        assert_eq!(&request.payload[..], br#"{"name":"rest req"}"#);
    }

    #[test]
    fn test_greeting() {
        let payload = Encoding::Binary
            .encode(&HelloReply {
                message: "grpc req".to_string(),
            })
            .unwrap();
        let reply = EnvelopeReply::new(SAY_HELLO, payload);
        assert_eq!(greeting(&reply, Encoding::Binary), "grpc req");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_greeter() {
        let dispatcher = slow_greeter_dispatcher(Duration::from_secs(5));
        assert!(dispatcher.contains(SAY_HELLO));

        let mut request = hello_request(Encoding::Json, "late");
        request.header.command = SLOW_SAY_HELLO;
        let started = tokio::time::Instant::now();
        let reply = dispatcher.dispatch(request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(reply.command, SLOW_SAY_HELLO);
    }

    #[test]
    fn test_greeter_routes() {
        let routes = greeter_routes("127.0.0.1:50052".parse().unwrap());
        let route = routes.resolve(SAY_HELLO).unwrap();
        assert_eq!(route.backend_address, "http://127.0.0.1:50052");
        assert!(routes.resolve(2000).is_err());
    }
}
