//! Connection Handler Module
//!
//! This module handles individual client connections. Each accepted socket
//! serves exactly one request/response exchange and is then closed.
//!
//! ## Exchange Lifecycle
//!
//! ```text
//! Accepted ──> ReadyToRead ──> Dispatching ──> Replying ──> Closed
//!                  │                │              │          ▲
//!                  └── read error / └── decode ────┴─ write ──┘
//!                      timeout / EOF    failure       failure
//! ```
//!
//! Every path ends in `Closed`: the stream is owned by the handler and is
//! dropped when `run` returns. Decode failures close the connection without
//! sending anything.

use crate::protocol::RequestError;
use bytes::{Bytes, BytesMut};
use socket2::{SockRef, TcpKeepalive};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Turns one raw request into the reply bytes for it.
///
/// Implemented by [`CommandHandler`](crate::commands::CommandHandler); any
/// `Fn(&[u8]) -> Result<Bytes, RequestError>` closure works as well.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, request: &[u8]) -> Result<Bytes, RequestError>;
}

impl<F> RequestHandler for F
where
    F: Fn(&[u8]) -> Result<Bytes, RequestError> + Send + Sync + 'static,
{
    fn handle(&self, request: &[u8]) -> Result<Bytes, RequestError> {
        self(request)
    }
}

/// Per-exchange bounds applied to every accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeLimits {
    /// How long to wait for request bytes
    pub read_timeout: Duration,
    /// Capacity of the single read
    pub buffer_size: usize,
    /// TCP keep-alive period
    pub keepalive: Duration,
}

impl Default for ExchangeLimits {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            buffer_size: 4096,
            keepalive: Duration::from_secs(300),
        }
    }
}

/// Where an exchange currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Accepted,
    ReadyToRead,
    Dispatching,
    Replying,
    Closed,
}

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Exchanges that sent a reply
    pub exchanges_completed: AtomicU64,
    /// Exchanges that ended without a reply
    pub exchanges_failed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn exchange_completed(&self) {
        self.exchanges_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exchange_failed(&self) {
        self.exchanges_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single request/response exchange.
///
/// Generic over the stream so the exchange can run on anything that reads
/// and writes bytes.
pub struct ConnectionHandler<S, H> {
    /// The client stream, closed when the handler is dropped
    stream: S,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Turns the request into reply bytes
    handler: H,

    limits: ExchangeLimits,

    state: ExchangeState,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S, H> ConnectionHandler<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: RequestHandler,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream for this connection
    /// * `addr` - The client's socket address
    /// * `handler` - Decodes and executes the request
    /// * `limits` - Read timeout and buffer bounds
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        handler: H,
        limits: ExchangeLimits,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream,
            addr,
            handler,
            limits,
            state: ExchangeState::Accepted,
            stats,
        }
    }

    /// Runs the exchange to completion and closes the connection.
    ///
    /// Failures are reported here, with the state the exchange failed in,
    /// and returned to the caller.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        debug!(client = %self.addr, "Client connected");

        let result = self.exchange().await;
        let last_state = self.state;
        self.transition(ExchangeState::Closed);

        match &result {
            Ok(()) => {
                self.stats.exchange_completed();
                debug!(client = %self.addr, "Exchange complete");
            }
            Err(e) => {
                self.stats.exchange_failed();
                match e {
                    ConnectionError::ClientDisconnected => {
                        debug!(client = %self.addr, "Client disconnected before sending a request")
                    }
                    ConnectionError::IoError(io_err)
                        if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                    {
                        debug!(client = %self.addr, "Connection reset by client")
                    }
                    _ => {
                        warn!(client = %self.addr, state = ?last_state, error = %e, "Exchange failed")
                    }
                }
            }
        }

        self.stats.connection_closed();
        result
    }

    /// Read, dispatch, reply. Strictly sequential.
    async fn exchange(&mut self) -> Result<(), ConnectionError> {
        self.transition(ExchangeState::ReadyToRead);
        let request = self.read_request().await?;

        self.transition(ExchangeState::Dispatching);
        let reply = self.handler.handle(&request)?;

        self.transition(ExchangeState::Replying);
        self.send_reply(&reply).await
    }

    fn transition(&mut self, next: ExchangeState) {
        trace!(client = %self.addr, from = ?self.state, to = ?next, "Exchange state");
        self.state = next;
    }

    /// Performs the single bounded read.
    async fn read_request(&mut self) -> Result<BytesMut, ConnectionError> {
        let mut buffer = BytesMut::zeroed(self.limits.buffer_size);

        let n = tokio::time::timeout(self.limits.read_timeout, self.stream.read(&mut buffer[..]))
            .await
            .map_err(|_| ConnectionError::ReadTimeout(self.limits.read_timeout))??;

        if n == 0 {
            return Err(ConnectionError::ClientDisconnected);
        }

        buffer.truncate(n);
        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read request");

        Ok(buffer)
    }

    /// Sends the reply to the client.
    async fn send_reply(&mut self, reply: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(reply).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(reply.len());
        trace!(
            client = %self.addr,
            bytes = reply.len(),
            "Sent reply"
        );
        Ok(())
    }
}

/// Errors that end an exchange without a reply.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No request bytes arrived before the read deadline
    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// The client closed the connection without sending anything
    #[error("Client disconnected")]
    ClientDisconnected,

    /// The request could not be tokenized or parsed
    #[error("Error processing request: {0}")]
    Request(#[from] RequestError),
}

/// Applies the keep-alive period to an accepted socket.
pub fn configure_socket(stream: &TcpStream, keepalive: Duration) -> std::io::Result<()> {
    let params = TcpKeepalive::new().with_time(keepalive);
    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    let params = params.with_interval(keepalive);

    SockRef::from(stream).set_tcp_keepalive(&params)
}

/// Handles a client connection.
///
/// This is a convenience function that configures the socket, creates a
/// ConnectionHandler and runs it to completion.
pub async fn handle_connection<H: RequestHandler>(
    stream: TcpStream,
    addr: SocketAddr,
    handler: H,
    limits: ExchangeLimits,
    stats: Arc<ConnectionStats>,
) {
    if let Err(e) = configure_socket(&stream, limits.keepalive) {
        debug!(client = %addr, error = %e, "Failed to set keep-alive");
    }

    // Failures are reported by `run`.
    let _ = ConnectionHandler::new(stream, addr, handler, limits, stats)
        .run()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandHandler;
    use crate::protocol::{ParseError, SyntaxError};
    use crate::storage::MemoryStore;
    use tokio::net::TcpListener;
    use tokio_test::io::Builder;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn command_handler() -> CommandHandler {
        CommandHandler::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_set_exchange() {
        let stats = Arc::new(ConnectionStats::new());
        let request = b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$5\r\ntest1\r\n";
        let stream = Builder::new().read(request).write(b"+OK\r\n").build();

        let handler = ConnectionHandler::new(
            stream,
            test_addr(),
            command_handler(),
            ExchangeLimits::default(),
            Arc::clone(&stats),
        );
        handler.run().await.unwrap();

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
        assert_eq!(stats.exchanges_completed.load(Ordering::Relaxed), 1);
        assert_eq!(
            stats.bytes_read.load(Ordering::Relaxed),
            request.len() as u64
        );
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn test_malformed_request_gets_no_reply() {
        let stats = Arc::new(ConnectionStats::new());
        // The mock fails the test if anything is written.
        let stream = Builder::new()
            .read(b"*2\r\n$3\r\nget\r\n$10\r\nname\r\n")
            .build();

        let result = ConnectionHandler::new(
            stream,
            test_addr(),
            command_handler(),
            ExchangeLimits::default(),
            Arc::clone(&stats),
        )
        .run()
        .await;

        assert!(matches!(
            result,
            Err(ConnectionError::Request(RequestError::Parse(
                ParseError::Syntax(SyntaxError::LengthMismatch { .. })
            )))
        ));
        assert_eq!(stats.exchanges_failed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_read_error_closes_without_reply() {
        let stream = Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "boom",
            ))
            .build();

        let result = ConnectionHandler::new(
            stream,
            test_addr(),
            command_handler(),
            ExchangeLimits::default(),
            Arc::new(ConnectionStats::new()),
        )
        .run()
        .await;

        assert!(matches!(result, Err(ConnectionError::IoError(_))));
    }

    #[tokio::test]
    async fn test_write_error_reported_and_closed() {
        let stats = Arc::new(ConnectionStats::new());
        let stream = Builder::new()
            .read(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
            .write_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "peer gone",
            ))
            .build();

        let result = ConnectionHandler::new(
            stream,
            test_addr(),
            command_handler(),
            ExchangeLimits::default(),
            Arc::clone(&stats),
        )
        .run()
        .await;

        assert!(matches!(result, Err(ConnectionError::IoError(_))));
        assert_eq!(stats.exchanges_failed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.exchanges_completed.load(Ordering::Relaxed), 0);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 0);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_eof_before_request() {
        let stream = Builder::new().build();

        let result = ConnectionHandler::new(
            stream,
            test_addr(),
            command_handler(),
            ExchangeLimits::default(),
            Arc::new(ConnectionStats::new()),
        )
        .run()
        .await;

        assert!(matches!(result, Err(ConnectionError::ClientDisconnected)));
    }

    #[tokio::test]
    async fn test_closure_handler_sees_only_bytes_read() {
        let stream = Builder::new().read(b"hello").write(b"+5\r\n").build();
        let handler = |request: &[u8]| -> Result<Bytes, RequestError> {
            Ok(Bytes::from(format!("+{}\r\n", request.len())))
        };

        ConnectionHandler::new(
            stream,
            test_addr(),
            handler,
            ExchangeLimits::default(),
            Arc::new(ConnectionStats::new()),
        )
        .run()
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_request_fills_at_most_buffer_size() {
        let stream = Builder::new().read(b"0123").write(b"+4\r\n").build();
        let handler = |request: &[u8]| -> Result<Bytes, RequestError> {
            assert_eq!(request, b"0123");
            Ok(Bytes::from(format!("+{}\r\n", request.len())))
        };
        let limits = ExchangeLimits {
            buffer_size: 4,
            ..ExchangeLimits::default()
        };

        ConnectionHandler::new(
            stream,
            test_addr(),
            handler,
            limits,
            Arc::new(ConnectionStats::new()),
        )
        .run()
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_read_timeout_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(ConnectionStats::new());
        let limits = ExchangeLimits {
            read_timeout: Duration::from_millis(50),
            ..ExchangeLimits::default()
        };

        let server_stats = Arc::clone(&stats);
        let server = tokio::spawn(async move {
            let (stream, client_addr) = listener.accept().await.unwrap();
            ConnectionHandler::new(stream, client_addr, command_handler(), limits, server_stats)
                .run()
                .await
        });

        let mut client = TcpStream::connect(addr).await.unwrap();

        // Send nothing; the server gives up and closes the socket.
        let mut buf = [0u8; 16];
        let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);

        let result = server.await.unwrap();
        assert!(matches!(result, Err(ConnectionError::ReadTimeout(_))));
        assert_eq!(stats.exchanges_failed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_handle_connection_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(ConnectionStats::new());

        let server_stats = Arc::clone(&stats);
        let server = tokio::spawn(async move {
            let (stream, client_addr) = listener.accept().await.unwrap();
            handle_connection(
                stream,
                client_addr,
                command_handler(),
                ExchangeLimits::default(),
                server_stats,
            )
            .await;
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$7\r\nmissing\r\n")
            .await
            .unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"$-1\r\n");

        server.await.unwrap();
        assert_eq!(stats.exchanges_completed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_configure_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();

        configure_socket(&client, Duration::from_secs(300)).unwrap();
    }
}
