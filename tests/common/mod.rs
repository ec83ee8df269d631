//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use request_sink::net::Listener;
use request_sink::{HttpServer, Request, Shutdown, SinkConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A running sink on an ephemeral port.
pub struct TestSink {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub requests: mpsc::UnboundedReceiver<Arc<Request>>,
    pub server: JoinHandle<()>,
}

/// Start a sink with one handler that forwards every request to a channel.
pub async fn start_sink(config: SinkConfig) -> TestSink {
    let (tx, requests) = mpsc::unbounded_channel();
    let mut server = HttpServer::new(config);
    server.handle_request(move |req: Arc<Request>| {
        let _ = tx.send(req);
    });

    let listener = Listener::bind_addr("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let notified = shutdown.notified();

    let server = tokio::spawn(async move {
        server.run(listener, notified).await;
    });

    TestSink {
        addr,
        shutdown,
        requests,
        server,
    }
}

/// Config with a short read window so failing cases finish quickly.
pub fn fast_config() -> SinkConfig {
    let mut config = SinkConfig::default();
    config.connection.read_timeout_ms = 300;
    config
}

/// Write `fragments` one by one with `gap` between them, then wait for the
/// server to close the connection. Returns whatever the server wrote back.
pub async fn send_fragments(addr: SocketAddr, fragments: &[&[u8]], gap: Duration) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(gap).await;
        }
        stream.write_all(fragment).await.unwrap();
        stream.flush().await.unwrap();
    }
    read_until_closed(&mut stream).await
}

/// Send `raw` in a single write and wait for the server to close.
pub async fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    send_fragments(addr, &[raw], Duration::ZERO).await
}

/// Read until EOF or reset; the sink never replies so this is normally empty.
pub async fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let read =
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received)).await;
    assert!(read.is_ok(), "server did not close the connection");
    received
}

/// Receive the next dispatched request, failing the test after one second.
pub async fn next_request(requests: &mut mpsc::UnboundedReceiver<Arc<Request>>) -> Arc<Request> {
    tokio::time::timeout(Duration::from_secs(1), requests.recv())
        .await
        .expect("no request dispatched")
        .expect("dispatcher dropped")
}

/// Assert that nothing is dispatched within a short window.
pub async fn assert_no_request(requests: &mut mpsc::UnboundedReceiver<Arc<Request>>) {
    let got = tokio::time::timeout(Duration::from_millis(200), requests.recv()).await;
    assert!(got.is_err(), "unexpected request dispatched: {:?}", got);
}
