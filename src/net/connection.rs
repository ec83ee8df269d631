//! Per-connection read loop and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Read chunks under a rolling deadline and accumulate them
//! - Re-run the parser after every read and act on its outcome
//! - Hand completed requests to the dispatcher
//! - Track live connections for shutdown
//!
//! # State Machine
//! ```text
//! Reading ──complete──▶ Dispatching
//!    │ ▲
//!    │ └─incomplete─┘
//!    └──malformed / timeout / read error / eof──▶ Aborted
//! ```
//! Both terminal states close the connection by dropping the stream.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ConnectionConfig;
use crate::dispatch::Dispatcher;
use crate::http::parser::{parse_request_with, ParseError, ParseOutcome};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where a connection is in its single-request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accumulating bytes until the parser recognizes a request.
    Reading,
    /// A request was handed to the dispatcher.
    Dispatching,
    /// Gave up without dispatching.
    Aborted,
}

/// Reasons a connection ends without dispatching a request.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("no data received within {0:?}")]
    ReadTimeout(Duration),

    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed request: {0}")]
    Malformed(#[from] ParseError),

    #[error("peer closed the connection before sending anything")]
    Closed,

    #[error("peer closed the connection with {buffered} bytes of an incomplete request")]
    UnexpectedEof { buffered: usize },

    #[error("request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },
}

/// How a connection ended.
#[derive(Debug)]
pub enum ConnectionOutcome {
    /// A request was parsed and handed to `handlers` handler tasks.
    Dispatched { handlers: usize },
    Aborted(ConnectionError),
}

impl ConnectionOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, ConnectionOutcome::Dispatched { .. })
    }
}

/// Owns one accepted connection until it has produced a request or failed.
pub struct ConnectionHandler {
    id: ConnectionId,
    peer_addr: Option<SocketAddr>,
    config: Arc<ConnectionConfig>,
    dispatcher: Arc<Dispatcher>,
    state: ConnectionState,
}

impl ConnectionHandler {
    pub fn new(
        id: ConnectionId,
        config: Arc<ConnectionConfig>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            id,
            peer_addr: None,
            config,
            dispatcher,
            state: ConnectionState::Reading,
        }
    }

    /// Record the remote address for log context.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drive the read/accumulate/parse loop to completion.
    ///
    /// Returns once a request has been dispatched or the connection has been
    /// given up on. The caller closes the stream by dropping it.
    pub async fn run<S>(&mut self, stream: &mut S) -> ConnectionOutcome
    where
        S: AsyncRead + Unpin,
    {
        let started = Instant::now();
        let read_timeout = self.config.read_timeout();
        let options = self.config.parse_options();

        let mut buf = BytesMut::new();
        let mut chunk = vec![0u8; self.config.chunk_size];

        loop {
            let n = match tokio::time::timeout(read_timeout, stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return self.abort(ConnectionError::Read(e)),
                Err(_) => return self.abort(ConnectionError::ReadTimeout(read_timeout)),
            };

            let eof = n == 0;
            if eof && buf.is_empty() {
                return self.abort(ConnectionError::Closed);
            }
            buf.extend_from_slice(&chunk[..n]);

            match parse_request_with(&buf, &options) {
                ParseOutcome::Complete(request) => {
                    self.state = ConnectionState::Dispatching;
                    tracing::info!(
                        connection_id = %self.id,
                        method = %String::from_utf8_lossy(request.method()),
                        target = %String::from_utf8_lossy(request.target()),
                        body_len = request.body().len(),
                        elapsed = ?started.elapsed(),
                        "Request processed"
                    );
                    let handlers = self.dispatcher.dispatch(request);
                    return ConnectionOutcome::Dispatched { handlers };
                }
                ParseOutcome::Incomplete if eof => {
                    return self.abort(ConnectionError::UnexpectedEof { buffered: buf.len() });
                }
                ParseOutcome::Incomplete => {
                    if let Some(limit) = self.config.max_request_bytes {
                        if buf.len() > limit {
                            return self.abort(ConnectionError::RequestTooLarge { limit });
                        }
                    }
                    tracing::trace!(
                        connection_id = %self.id,
                        buffered = buf.len(),
                        "Waiting for more bytes"
                    );
                }
                ParseOutcome::Malformed(err) => {
                    return self.abort(ConnectionError::Malformed(err));
                }
            }
        }
    }

    fn abort(&mut self, err: ConnectionError) -> ConnectionOutcome {
        self.state = ConnectionState::Aborted;

        let peer_addr = self
            .peer_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string());

        match &err {
            ConnectionError::Read(_) => {
                tracing::warn!(
                    connection_id = %self.id,
                    peer_addr = %peer_addr,
                    error = %err,
                    "Connection aborted"
                );
            }
            _ => {
                tracing::debug!(
                    connection_id = %self.id,
                    peer_addr = %peer_addr,
                    error = %err,
                    "Connection aborted"
                );
            }
        }

        ConnectionOutcome::Aborted(err)
    }
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    /// Current count of active connections.
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until all tracked connections have closed.
    pub async fn wait_idle(&self) {
        while self.active_count.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
