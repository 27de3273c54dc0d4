//! Envelope clients for each gateway transport.
//!
//! Used by `gatekit-client` and the end-to-end tests. Every client sends an
//! [`EnvelopeRequest`] and returns the decoded [`EnvelopeReply`].

use futures::{SinkExt, StreamExt};
use gatekit_core::{
    DecodeError, EncodeError, Encoding, EnvelopeReply, EnvelopeRequest, wire,
};
use gatekit_server::{HelloReply, HelloRequest, SAY_HELLO};
use gatekit_transport::grpc::STREAM_BUFFER;
use gatekit_transport::proto::gateway::envelope_gateway_client::EnvelopeGatewayClient;
use miette::Diagnostic;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tonic::Streaming;
use tonic::transport::Channel;

/// Client-side failures.
#[derive(Error, Diagnostic, Debug)]
pub enum ClientError {
    /// The gRPC channel could not be opened.
    #[error("cannot connect to {uri}")]
    #[diagnostic(code(gatekit::client::connect), help("Is the gateway running?"))]
    Connect {
        /// The gateway URI.
        uri: String,
        /// Underlying transport error.
        #[source]
        source: tonic::transport::Error,
    },

    /// The gateway answered a gRPC call with an error status.
    #[error("gateway returned {}: {}", .0.code(), .0.message())]
    #[diagnostic(code(gatekit::client::status))]
    Status(#[from] tonic::Status),

    /// The HTTP request failed.
    #[error("HTTP request failed: {0}")]
    #[diagnostic(code(gatekit::client::http))]
    Http(#[from] reqwest::Error),

    /// The REST endpoint answered with a non-success status.
    #[error("gateway returned HTTP {status}: {body}")]
    #[diagnostic(code(gatekit::client::http_status))]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The error body.
        body: String,
    },

    /// The WebSocket failed.
    #[error("WebSocket error: {0}")]
    #[diagnostic(code(gatekit::client::websocket))]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The gateway closed the WebSocket instead of replying.
    #[error("connection closed ({code}): {reason}")]
    #[diagnostic(code(gatekit::client::closed))]
    Closed {
        /// The close code.
        code: u16,
        /// The close reason.
        reason: String,
    },

    /// The stream or socket ended before a reply arrived.
    #[error("connection ended before a reply arrived")]
    #[diagnostic(code(gatekit::client::ended))]
    Ended,

    /// A reply or greeting could not be decoded.
    #[error(transparent)]
    #[diagnostic(code(gatekit::client::decode))]
    Decode(#[from] DecodeError),

    /// A request could not be encoded.
    #[error(transparent)]
    #[diagnostic(code(gatekit::client::encode))]
    Encode(#[from] EncodeError),
}

/// Open a gRPC channel to the gateway.
pub async fn connect_grpc(uri: &str) -> Result<EnvelopeGatewayClient<Channel>, ClientError> {
    EnvelopeGatewayClient::connect(uri.to_string())
        .await
        .map_err(|source| ClientError::Connect {
            uri: uri.to_string(),
            source,
        })
}

/// One `HandleEnvelope` call.
pub async fn call_unary(
    client: &mut EnvelopeGatewayClient<Channel>,
    request: EnvelopeRequest,
) -> Result<EnvelopeReply, ClientError> {
    let reply = client
        .handle_envelope(wire::EnvelopeRequest::from(request))
        .await?
        .into_inner();
    Ok(reply.into())
}

/// Posts JSON envelopes to the REST endpoint.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    url: String,
}

impl RestClient {
    /// Create a client for the REST endpoint at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Send one envelope.
    pub async fn call(&self, request: &EnvelopeRequest) -> Result<EnvelopeReply, ClientError> {
        let response = self
            .http
            .post(&self.url)
            .header("content-type", "application/json")
            .body(request.encode_json()?)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(EnvelopeReply::decode_json(&body)?)
    }
}

/// One WebSocket connection to the gateway.
pub struct WsClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Connect to the WebSocket endpoint at `url`.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _) = tokio_tungstenite::connect_async(url).await?;
        Ok(Self { socket })
    }

    /// Send one envelope as a text frame without waiting for the reply.
    pub async fn send(&mut self, request: &EnvelopeRequest) -> Result<(), ClientError> {
        let json = request.encode_json()?;
        let text = String::from_utf8_lossy(&json).into_owned();
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Wait for the next reply.
    pub async fn recv(&mut self) -> Result<EnvelopeReply, ClientError> {
        while let Some(message) = self.socket.next().await {
            match message? {
                Message::Text(text) => return Ok(EnvelopeReply::decode_json(text.as_bytes())?),
                Message::Binary(bytes) => return Ok(EnvelopeReply::decode_json(&bytes)?),
                Message::Close(frame) => {
                    let (code, reason) = frame.map_or((1005, String::new()), |frame| {
                        (u16::from(frame.code), frame.reason.into_owned())
                    });
                    return Err(ClientError::Closed { code, reason });
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Err(ClientError::Ended)
    }

    /// Send one envelope and wait for its reply.
    pub async fn call(&mut self, request: &EnvelopeRequest) -> Result<EnvelopeReply, ClientError> {
        self.send(request).await?;
        self.recv().await
    }

    /// Close the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}

/// One `HandleEnvelopeStream` call.
pub struct StreamClient {
    outbound: mpsc::Sender<wire::EnvelopeRequest>,
    inbound: Streaming<wire::EnvelopeReply>,
}

impl StreamClient {
    /// Open a stream on `client`.
    pub async fn open(client: &mut EnvelopeGatewayClient<Channel>) -> Result<Self, ClientError> {
        let (outbound, rx) = mpsc::channel(STREAM_BUFFER);
        let inbound = client
            .handle_envelope_stream(ReceiverStream::new(rx))
            .await?
            .into_inner();
        Ok(Self { outbound, inbound })
    }

    /// Queue one envelope without waiting for the reply.
    pub async fn send(&self, request: EnvelopeRequest) -> Result<(), ClientError> {
        self.outbound
            .send(request.into())
            .await
            .map_err(|_| ClientError::Ended)
    }

    /// Wait for the next reply. A terminating error status surfaces as
    /// [`ClientError::Status`].
    pub async fn recv(&mut self) -> Result<EnvelopeReply, ClientError> {
        match self.inbound.message().await? {
            Some(reply) => Ok(reply.into()),
            None => Err(ClientError::Ended),
        }
    }

    /// Send one envelope and wait for its reply.
    pub async fn call(&mut self, request: EnvelopeRequest) -> Result<EnvelopeReply, ClientError> {
        self.send(request).await?;
        self.recv().await
    }

    /// Close the request side and wait for the gateway to end the stream.
    pub async fn finish(self) -> Result<(), ClientError> {
        let Self {
            outbound,
            mut inbound,
        } = self;
        drop(outbound);
        while inbound.message().await?.is_some() {}
        Ok(())
    }
}

/// A `SayHello` envelope.
pub fn hello_envelope(
    encoding: Encoding,
    requester_id: &str,
    name: &str,
) -> Result<EnvelopeRequest, ClientError> {
    let payload = encoding.encode(&HelloRequest {
        name: name.to_string(),
    })?;
    Ok(EnvelopeRequest::new(SAY_HELLO, payload)
        .with_requester_id(requester_id)
        .with_encoding(encoding))
}

/// The greeting carried by a `SayHello` reply.
pub fn read_greeting(reply: &EnvelopeReply, encoding: Encoding) -> Result<String, ClientError> {
    let greeting: HelloReply = encoding.decode(&reply.payload)?;
    Ok(greeting.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hello_envelope_round_trip() {
        for encoding in [Encoding::Binary, Encoding::Json] {
            let request = hello_envelope(encoding, "uid123", "grpc req").unwrap();
            assert_eq!(request.command(), SAY_HELLO);
            assert_eq!(request.encoding(), encoding);

            let reply = EnvelopeReply::new(
                SAY_HELLO,
                encoding
                    .encode(&HelloReply {
                        message: "grpc req".to_string(),
                    })
                    .unwrap(),
            );
            assert_eq!(read_greeting(&reply, encoding).unwrap(), "grpc req");
        }
    }

    #[test]
    fn test_status_error_message() {
        let err = ClientError::from(tonic::Status::not_found("unroutable command 9999"));
        assert!(err.to_string().contains("unroutable command 9999"));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = connect_grpc(&format!("http://{addr}")).await.unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }));
    }
}
