//! Sends `SayHello` through each gateway transport and logs the greetings.
//!
//! ```bash
//! gatekit-client all
//! gatekit-client ws --count 5 --interval-ms 500
//! ```

use std::time::Duration;

use clap::{Parser, Subcommand};
use gatekit::client::{
    ClientError, RestClient, StreamClient, WsClient, call_unary, connect_grpc, hello_envelope,
    read_greeting,
};
use gatekit::config::{DEFAULT_REST_PATH, DEFAULT_WS_PATH};
use gatekit::error::ServeError;
use gatekit::logging::{LogFormat, init_tracing};
use gatekit::Encoding;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about = "Demo client for the gatekit gateway")]
struct Args {
    /// gRPC gateway URI.
    #[arg(long, env = "GATEKIT_CLIENT_GRPC", default_value = "http://127.0.0.1:50051")]
    grpc: String,

    /// HTTP gateway base URL.
    #[arg(long, env = "GATEKIT_CLIENT_HTTP", default_value = "http://127.0.0.1:50050")]
    http: String,

    /// Messages sent on repeating transports.
    #[arg(long, default_value_t = 3)]
    count: u32,

    /// Pause between repeated messages, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Log output format.
    #[arg(long, env = "GATEKIT_LOG_FORMAT", value_enum, default_value_t)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// One gRPC unary call, binary encoding.
    Unary,
    /// One REST call, JSON encoding.
    Rest,
    /// Repeated WebSocket messages, JSON encoding.
    Ws,
    /// Repeated messages on one gRPC stream, binary encoding.
    Stream,
    /// Every transport in turn.
    All,
}

struct Demo {
    args: Args,
    requester_id: String,
}

impl Demo {
    fn interval(&self) -> Duration {
        Duration::from_millis(self.args.interval_ms)
    }

    async fn unary(&self) -> Result<(), ClientError> {
        let mut client = connect_grpc(&self.args.grpc).await?;
        let request = hello_envelope(Encoding::Binary, &self.requester_id, "grpc req")?;
        let reply = call_unary(&mut client, request).await?;
        info!(
            transport = "grpc",
            greeting = %read_greeting(&reply, Encoding::Binary)?,
            "Reply"
        );
        Ok(())
    }

    async fn rest(&self) -> Result<(), ClientError> {
        let client = RestClient::new(format!("{}{DEFAULT_REST_PATH}", self.args.http));
        let request = hello_envelope(Encoding::Json, &self.requester_id, "rest req")?;
        let reply = client.call(&request).await?;
        info!(
            transport = "rest",
            greeting = %read_greeting(&reply, Encoding::Json)?,
            "Reply"
        );
        Ok(())
    }

    async fn ws(&self) -> Result<(), ClientError> {
        let base = self.args.http.replacen("http", "ws", 1);
        let mut client = WsClient::connect(&format!("{base}{DEFAULT_WS_PATH}")).await?;
        for i in 0..self.args.count {
            let request = hello_envelope(Encoding::Json, &self.requester_id, "ws req")?;
            let reply = client.call(&request).await?;
            info!(
                transport = "ws",
                seq = i,
                greeting = %read_greeting(&reply, Encoding::Json)?,
                "Reply"
            );
            tokio::time::sleep(self.interval()).await;
        }
        client.close().await
    }

    async fn stream(&self) -> Result<(), ClientError> {
        let mut grpc = connect_grpc(&self.args.grpc).await?;
        let mut stream = StreamClient::open(&mut grpc).await?;
        for i in 0..self.args.count {
            let request = hello_envelope(Encoding::Binary, &self.requester_id, "grpc stream req")?;
            let reply = stream.call(request).await?;
            info!(
                transport = "grpc-stream",
                seq = i,
                greeting = %read_greeting(&reply, Encoding::Binary)?,
                "Reply"
            );
            tokio::time::sleep(self.interval()).await;
        }
        stream.finish().await
    }

    async fn run(&self, command: Command) -> Result<(), ClientError> {
        match command {
            Command::Unary => self.unary().await,
            Command::Rest => self.rest().await,
            Command::Ws => self.ws().await,
            Command::Stream => self.stream().await,
            Command::All => {
                self.unary().await?;
                self.rest().await?;
                self.ws().await?;
                self.stream().await
            }
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format).map_err(|e| ServeError::Logging(e.to_string()))?;

    let command = args.command;
    let demo = Demo {
        args,
        requester_id: uuid::Uuid::new_v4().to_string(),
    };
    info!(requester_id = %demo.requester_id, ?command, "Client starting");
    demo.run(command).await?;
    Ok(())
}
