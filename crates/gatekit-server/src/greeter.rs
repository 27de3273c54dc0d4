//! The reference Greeter service.
//!
//! `SayHello` (command [`SAY_HELLO`]) answers with the caller's name. It is
//! reachable two ways: as an envelope command through the dispatcher, and
//! directly as `gatekit.greeter.Greeter/SayHello`.

use serde::{Deserialize, Serialize};
use tonic::{Request, Response, Status};

use crate::dispatcher::{Dispatcher, HandlerError};
use crate::proto::greeter_server::Greeter;

/// Command number of `SayHello`.
pub const SAY_HELLO: u32 = 1000;

/// `SayHello` input. JSON form: `{"name": "..."}`.
#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct HelloRequest {
    /// Who to greet.
    #[prost(string, tag = "1")]
    #[serde(default)]
    pub name: String,
}

/// `SayHello` output. JSON form: `{"message": "..."}`.
#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct HelloReply {
    /// The greeting.
    #[prost(string, tag = "1")]
    #[serde(default)]
    pub message: String,
}

/// Greet by echoing the name.
pub async fn say_hello(request: HelloRequest) -> Result<HelloReply, HandlerError> {
    tracing::info!(name = %request.name, "SayHello");
    Ok(HelloReply {
        message: request.name,
    })
}

/// A dispatcher serving the Greeter commands.
#[must_use]
pub fn greeter_dispatcher() -> Dispatcher {
    Dispatcher::builder().handler(SAY_HELLO, say_hello).build()
}

/// Serves `gatekit.greeter.Greeter` with typed messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreeterService;

#[tonic::async_trait]
impl Greeter for GreeterService {
    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        say_hello(request.into_inner())
            .await
            .map(Response::new)
            .map_err(|e| Status::internal(e.to_string()))
    }
}
