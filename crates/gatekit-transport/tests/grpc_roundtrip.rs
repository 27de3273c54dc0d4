//! gRPC invoker and gateway adapter tests against a live backend.
//!
//! The backend here is a bare `EnvelopeBackend` implementation:
//! - command 1500 sleeps before replying
//! - command 1999 is rejected with UNIMPLEMENTED
//! - everything else echoes its payload
//!
//! Its accepted sockets are wrapped so tests can see when a caller hangs up.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use gatekit_core::{
    Encoding, EnvelopeReply, EnvelopeRequest, Gateway, InvokeError, Invoker, RoutingTable, wire,
};
use gatekit_testing::with_timeout;
use gatekit_transport::grpc::{self, GrpcServerConfig};
use gatekit_transport::proto::backend::envelope_backend_server::{
    EnvelopeBackend, EnvelopeBackendServer,
};
use gatekit_transport::proto::gateway::envelope_gateway_client::EnvelopeGatewayClient;
use gatekit_transport::GrpcInvoker;
use pretty_assertions::assert_eq;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::transport::server::Connected;
use tonic::{Code, Request, Response, Status};

const INTERFACE: &str = "gatekit.backend.EnvelopeBackend/HandleEnvelope";
const SLOW_COMMAND: u32 = 1500;
const REJECTED_COMMAND: u32 = 1999;

struct EchoBackend;

#[tonic::async_trait]
impl EnvelopeBackend for EchoBackend {
    async fn handle_envelope(
        &self,
        request: Request<wire::EnvelopeRequest>,
    ) -> Result<Response<wire::EnvelopeReply>, Status> {
        let request = request.into_inner();
        let command = request.header.map(|h| h.command).unwrap_or_default();
        match command {
            SLOW_COMMAND => tokio::time::sleep(Duration::from_millis(500)).await,
            REJECTED_COMMAND => {
                return Err(Status::unimplemented(format!("unknown command {command}")));
            }
            _ => {}
        }
        Ok(Response::new(wire::EnvelopeReply {
            command,
            payload: request.payload,
        }))
    }
}

/// Counts sockets the backend accepted and sockets the peer closed.
#[derive(Debug, Default)]
struct Connections {
    accepted: AtomicUsize,
    closed: AtomicUsize,
    changed: Notify,
}

impl Connections {
    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    async fn wait_closed(&self, count: usize) {
        loop {
            let changed = self.changed.notified();
            if self.closed() >= count {
                return;
            }
            changed.await;
        }
    }
}

/// A server-side socket that reports EOF or a read error to [`Connections`].
struct TrackedStream {
    inner: TcpStream,
    connections: Arc<Connections>,
    closed: bool,
}

impl TrackedStream {
    fn new(inner: TcpStream, connections: Arc<Connections>) -> Self {
        connections.accepted.fetch_add(1, Ordering::SeqCst);
        Self {
            inner,
            connections,
            closed: false,
        }
    }

    fn mark_closed(&mut self) {
        if !self.closed {
            self.closed = true;
            self.connections.closed.fetch_add(1, Ordering::SeqCst);
            self.connections.changed.notify_waiters();
        }
    }
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        let eof = matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() == before;
        if eof || matches!(poll, Poll::Ready(Err(_))) {
            self.mark_closed();
        }
        poll
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl Connected for TrackedStream {
    type ConnectInfo = <TcpStream as Connected>::ConnectInfo;

    fn connect_info(&self) -> Self::ConnectInfo {
        self.inner.connect_info()
    }
}

async fn spawn_tracked_backend(token: &CancellationToken) -> (SocketAddr, Arc<Connections>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(Connections::default());
    let tracked = Arc::clone(&connections);
    let incoming = TcpListenerStream::new(listener)
        .map(move |socket| socket.map(|socket| TrackedStream::new(socket, Arc::clone(&tracked))));
    let shutdown = token.clone();
    tokio::spawn(async move {
        Server::builder()
            .add_service(EnvelopeBackendServer::new(EchoBackend))
            .serve_with_incoming_shutdown(incoming, async move {
                shutdown.cancelled().await;
            })
            .await
            .unwrap();
    });
    (addr, connections)
}

async fn spawn_backend(token: &CancellationToken) -> SocketAddr {
    spawn_tracked_backend(token).await.0
}

async fn spawn_gateway(token: &CancellationToken, backend: SocketAddr) -> SocketAddr {
    let routes = RoutingTable::builder()
        .route(1000..2000, format!("http://{backend}"), INTERFACE)
        .build()
        .unwrap();
    let gateway =
        Gateway::new(routes, GrpcInvoker::new()).with_timeout(Duration::from_millis(200));

    let config = GrpcServerConfig::new("127.0.0.1:0");
    let listener = grpc::bind(&config.addr).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = token.clone();
    tokio::spawn(async move {
        grpc::serve_gateway(listener, gateway, &config, shutdown)
            .await
            .unwrap();
    });
    addr
}

fn route_to(backend: SocketAddr) -> RoutingTable {
    RoutingTable::builder()
        .route(1000..2000, format!("http://{backend}"), INTERFACE)
        .build()
        .unwrap()
}

// =============================================================================
// Invoker
// =============================================================================

#[tokio::test]
async fn test_invoker_forwards_envelope() {
    let token = CancellationToken::new();
    let backend = spawn_backend(&token).await;
    let routes = route_to(backend);

    let request = EnvelopeRequest::new(1000, b"payload".to_vec()).with_requester_id("uid123");
    let reply = GrpcInvoker::new()
        .invoke(routes.resolve(1000).unwrap(), &request, Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(reply, EnvelopeReply::new(1000, b"payload".to_vec()));
    token.cancel();
}

#[tokio::test]
async fn test_invoker_enforces_timeout() {
    let token = CancellationToken::new();
    let (backend, connections) = spawn_tracked_backend(&token).await;
    let routes = route_to(backend);

    let timeout = Duration::from_millis(100);
    let started = Instant::now();
    let err = GrpcInvoker::new()
        .invoke(
            routes.resolve(SLOW_COMMAND).unwrap(),
            &EnvelopeRequest::new(SLOW_COMMAND, Vec::new()),
            timeout,
        )
        .await
        .unwrap_err();

    assert_eq!(err, InvokeError::Timeout { timeout });
    assert!(started.elapsed() < Duration::from_millis(450));

    // The call's channel is gone, so the backend reads EOF well before its
    // handler would have replied.
    with_timeout(Duration::from_secs(2), connections.wait_closed(1)).await;
    assert_eq!(connections.accepted(), 1);
    assert_eq!(connections.closed(), 1);
    token.cancel();
}

#[tokio::test]
async fn test_invoker_uses_one_connection_per_call() {
    let token = CancellationToken::new();
    let (backend, connections) = spawn_tracked_backend(&token).await;
    let routes = route_to(backend);
    let invoker = GrpcInvoker::new();

    for i in 0..3u32 {
        let request = EnvelopeRequest::new(1000 + i, Vec::new());
        invoker
            .invoke(routes.resolve(1000 + i).unwrap(), &request, Duration::from_secs(2))
            .await
            .unwrap();
    }

    with_timeout(Duration::from_secs(2), connections.wait_closed(3)).await;
    assert_eq!(connections.accepted(), 3);
    token.cancel();
}

#[tokio::test]
async fn test_invoker_reports_backend_rejection() {
    let token = CancellationToken::new();
    let backend = spawn_backend(&token).await;
    let routes = route_to(backend);

    let err = GrpcInvoker::new()
        .invoke(
            routes.resolve(REJECTED_COMMAND).unwrap(),
            &EnvelopeRequest::new(REJECTED_COMMAND, Vec::new()),
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        InvokeError::BackendRejected {
            code: Code::Unimplemented as i32,
            message: "unknown command 1999".to_string(),
        }
    );
    token.cancel();
}

#[tokio::test]
async fn test_invoker_unknown_method_is_rejected() {
    let token = CancellationToken::new();
    let backend = spawn_backend(&token).await;
    let routes = RoutingTable::builder()
        .route(1000..2000, format!("http://{backend}"), "/gatekit.backend.Nope/Call")
        .build()
        .unwrap();

    let err = GrpcInvoker::new()
        .invoke(
            routes.resolve(1000).unwrap(),
            &EnvelopeRequest::new(1000, Vec::new()),
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InvokeError::BackendRejected { code, .. } if code == Code::Unimplemented as i32
    ));
    token.cancel();
}

// =============================================================================
// Gateway adapter
// =============================================================================

#[tokio::test]
async fn test_unary_through_gateway() {
    let token = CancellationToken::new();
    let backend = spawn_backend(&token).await;
    let gateway = spawn_gateway(&token, backend).await;

    let mut client = EnvelopeGatewayClient::connect(format!("http://{gateway}"))
        .await
        .unwrap();
    let request = EnvelopeRequest::new(1000, b"grpc req".to_vec())
        .with_requester_id("uid123")
        .with_encoding(Encoding::Binary);
    let reply = client
        .handle_envelope(wire::EnvelopeRequest::from(request))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(reply.command, 1000);
    assert_eq!(&reply.payload[..], b"grpc req");
    token.cancel();
}

#[tokio::test]
async fn test_unary_error_statuses() {
    let token = CancellationToken::new();
    let backend = spawn_backend(&token).await;
    let gateway = spawn_gateway(&token, backend).await;
    let mut client = EnvelopeGatewayClient::connect(format!("http://{gateway}"))
        .await
        .unwrap();

    let cases = [
        (9999, Code::NotFound),
        (SLOW_COMMAND, Code::DeadlineExceeded),
        (REJECTED_COMMAND, Code::Unimplemented),
    ];
    for (command, code) in cases {
        let status = client
            .handle_envelope(wire::EnvelopeRequest::from(EnvelopeRequest::new(
                command,
                Vec::new(),
            )))
            .await
            .unwrap_err();
        assert_eq!(status.code(), code, "command {command}");
    }

    let headless = wire::EnvelopeRequest {
        header: None,
        payload: bytes::Bytes::new(),
    };
    let status = client.handle_envelope(headless).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    token.cancel();
}

#[tokio::test]
async fn test_stream_replies_in_order() {
    let token = CancellationToken::new();
    let backend = spawn_backend(&token).await;
    let gateway = spawn_gateway(&token, backend).await;
    let mut client = EnvelopeGatewayClient::connect(format!("http://{gateway}"))
        .await
        .unwrap();

    let requests: Vec<wire::EnvelopeRequest> = (0..10u32)
        .map(|i| EnvelopeRequest::new(1000 + i, format!("msg {i}").into_bytes()).into())
        .collect();
    let mut replies = client
        .handle_envelope_stream(tokio_stream::iter(requests))
        .await
        .unwrap()
        .into_inner();

    for i in 0..10u32 {
        let reply = replies.message().await.unwrap().unwrap();
        assert_eq!(reply.command, 1000 + i);
        assert_eq!(reply.payload, format!("msg {i}").into_bytes());
    }
    assert!(replies.message().await.unwrap().is_none());
    token.cancel();
}

#[tokio::test]
async fn test_stream_ends_on_first_error() {
    let token = CancellationToken::new();
    let backend = spawn_backend(&token).await;
    let gateway = spawn_gateway(&token, backend).await;
    let mut client = EnvelopeGatewayClient::connect(format!("http://{gateway}"))
        .await
        .unwrap();

    let requests: Vec<wire::EnvelopeRequest> = [1000, 9999, 1001]
        .into_iter()
        .map(|command| EnvelopeRequest::new(command, Vec::new()).into())
        .collect();
    let mut replies = client
        .handle_envelope_stream(tokio_stream::iter(requests))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(replies.message().await.unwrap().unwrap().command, 1000);
    let status = replies.message().await.unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
    token.cancel();
}
