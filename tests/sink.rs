//! End-to-end tests: raw TCP clients against a running sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use request_sink::http::IncompleteHead;
use request_sink::net::Listener;
use request_sink::{HttpServer, Request, Shutdown};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

mod common;

#[tokio::test]
async fn simple_get_is_dispatched_and_never_answered() {
    let mut sink = common::start_sink(common::fast_config()).await;

    let reply = common::send(sink.addr, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert!(reply.is_empty(), "sink must not write a response");

    let req = common::next_request(&mut sink.requests).await;
    assert_eq!(req.method(), b"GET");
    assert_eq!(req.target(), b"/");
    assert_eq!(req.version(), b"HTTP/1.1");
    assert_eq!(req.headers().len(), 1);
    assert_eq!(req.header("Host"), Some(&b"x"[..]));
    assert!(req.body().is_empty());
}

#[tokio::test]
async fn body_arriving_later_completes_the_request() {
    let mut sink = common::start_sink(common::fast_config()).await;

    common::send_fragments(
        sink.addr,
        &[b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nab", b"cde"],
        Duration::from_millis(50),
    )
    .await;

    let req = common::next_request(&mut sink.requests).await;
    assert_eq!(req.body(), b"abcde");
}

#[tokio::test]
async fn zero_length_body_completes_immediately() {
    let mut sink = common::start_sink(common::fast_config()).await;

    common::send(sink.addr, b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n").await;

    let req = common::next_request(&mut sink.requests).await;
    assert!(req.body().is_empty());
}

#[tokio::test]
async fn malformed_inputs_are_dropped() {
    let mut sink = common::start_sink(common::fast_config()).await;

    let inputs: [&[u8]; 3] = [
        b"GET /\r\nHost: x\r\n\r\n",
        b"GET / HTTP/1.1\r\nX-\xff: v\r\n\r\n",
        b"POST / HTTP/1.1\r\nContent-Length: many\r\n\r\nbody",
    ];
    for raw in inputs {
        let reply = common::send(sink.addr, raw).await;
        assert!(reply.is_empty());
    }

    common::assert_no_request(&mut sink.requests).await;
}

#[tokio::test]
async fn only_the_first_request_on_a_connection_is_read() {
    let mut sink = common::start_sink(common::fast_config()).await;

    common::send(
        sink.addr,
        b"POST /first HTTP/1.1\r\nContent-Length: 2\r\n\r\nokGET /second HTTP/1.1\r\n\r\n",
    )
    .await;

    let req = common::next_request(&mut sink.requests).await;
    assert_eq!(req.target(), b"/first");
    assert_eq!(req.body(), b"ok");
    common::assert_no_request(&mut sink.requests).await;
}

#[tokio::test]
async fn silent_client_is_disconnected() {
    let mut sink = common::start_sink(common::fast_config()).await;

    let mut stream = TcpStream::connect(sink.addr).await.unwrap();
    let reply = common::read_until_closed(&mut stream).await;
    assert!(reply.is_empty());
    common::assert_no_request(&mut sink.requests).await;
}

#[tokio::test]
async fn split_head_waits_when_configured() {
    let mut config = common::fast_config();
    config.connection.incomplete_head = IncompleteHead::Wait;
    let mut sink = common::start_sink(config).await;

    common::send_fragments(
        sink.addr,
        &[b"GET /sp", b"lit HTTP/1.1\r\nHo", b"st: y\r\n", b"\r\n"],
        Duration::from_millis(30),
    )
    .await;

    let req = common::next_request(&mut sink.requests).await;
    assert_eq!(req.target(), b"/split");
    assert_eq!(req.header("host"), Some(&b"y"[..]));
}

#[tokio::test]
async fn concurrent_connections_are_independent() {
    let mut sink = common::start_sink(common::fast_config()).await;
    let addr = sink.addr;

    // Interleave the two clients' writes so their bytes overlap in time.
    let mut a = TcpStream::connect(addr).await.unwrap();
    let mut b = TcpStream::connect(addr).await.unwrap();
    a.write_all(b"POST /a HTTP/1.1\r\nContent-Length: 6\r\n\r\naaa").await.unwrap();
    b.write_all(b"POST /b HTTP/1.1\r\nContent-Length: 6\r\n\r\nbbb").await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    b.write_all(b"BBB").await.unwrap();
    a.write_all(b"AAA").await.unwrap();

    common::read_until_closed(&mut a).await;
    common::read_until_closed(&mut b).await;

    let mut bodies = vec![
        common::next_request(&mut sink.requests).await,
        common::next_request(&mut sink.requests).await,
    ];
    bodies.sort_by(|x, y| x.target().cmp(y.target()));
    assert_eq!(bodies[0].target(), b"/a");
    assert_eq!(bodies[0].body(), b"aaaAAA");
    assert_eq!(bodies[1].target(), b"/b");
    assert_eq!(bodies[1].body(), b"bbbBBB");
}

#[tokio::test]
async fn every_handler_runs_for_every_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = HttpServer::new(common::fast_config());
    for _ in 0..3 {
        let calls = Arc::clone(&calls);
        server.handle_request(move |_req: Arc<Request>| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    let listener = Listener::bind_addr("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.notified()));

    for path in ["/one", "/two"] {
        let raw = format!("GET {} HTTP/1.1\r\n\r\n", path);
        common::send(addr, raw.as_bytes()).await;
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while calls.load(Ordering::SeqCst) < 6 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 6);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let sink = common::start_sink(common::fast_config()).await;
    let addr = sink.addr;

    sink.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), sink.server)
        .await
        .unwrap()
        .unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}
