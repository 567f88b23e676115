//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::any,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use ws_bridge::net::SessionTracker;
use ws_bridge::{BackendCaller, BridgeServer, Shutdown, TargetConfig};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What a mock backend saw for one request.
#[derive(Debug)]
pub struct Seen {
    pub method: axum::http::Method,
    pub headers: HeaderMap,
    pub body: String,
}

/// Start a programmable mock backend on a free port.
///
/// Every request is reported on the returned channel, then answered by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, mpsc::UnboundedReceiver<Seen>)
where
    F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = (StatusCode, String)> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |method: axum::http::Method, headers: HeaderMap, body: String| {
        let tx = tx.clone();
        let f = f.clone();
        async move {
            let reply = f(body.clone()).await;
            let _ = tx.send(Seen {
                method,
                headers,
                body,
            });
            reply
        }
    };
    let router = Router::new()
        .route("/", any(handler.clone()))
        .route("/{*path}", any(handler));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, rx)
}

/// Start a mock backend that always returns `response` with 200 OK.
pub async fn start_mock_backend(response: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<Seen>) {
    start_programmable_backend(move |_| async move { (StatusCode::OK, response.to_string()) }).await
}

/// Start a raw TCP backend that promises a 100 byte body, sends 7 bytes and hangs up.
///
/// Returns the number of requests it has answered.
pub async fn start_truncating_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let answered = Arc::new(AtomicUsize::new(0));
    let counter = answered.clone();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                    .await;
            });
        }
    });
    (addr, answered)
}

/// Consume one request head and its `Content-Length` body.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                return;
            }
        }
    }
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running bridge under test.
pub struct TestBridge {
    pub addr: SocketAddr,
    pub sessions: SessionTracker,
    pub shutdown: Shutdown,
}

impl TestBridge {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Open a WebSocket connection to the bridge.
    pub async fn connect(&self) -> Client {
        let (ws, response) = tokio_tungstenite::connect_async(self.ws_url())
            .await
            .expect("dialing bridge");
        assert_eq!(response.status(), 101);
        ws
    }

    /// Wait until the live session count reaches `expected`.
    pub async fn wait_for_sessions(&self, expected: u64) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.sessions.active() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {} sessions, have {}",
                expected,
                self.sessions.active()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a bridge in front of `target_url`.
pub async fn start_bridge(method: &str, target_url: &str, headers: &[(&str, &str)]) -> TestBridge {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let target = TargetConfig::new(method, target_url, headers).unwrap();
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let caller = BackendCaller::with_client(Arc::new(target), client);

    let server = BridgeServer::new(Arc::new(caller));
    let sessions = server.sessions().clone();
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let signalled = shutdown.signalled();
    tokio::spawn(async move {
        let _ = server.run(listener, signalled).await;
    });

    TestBridge {
        addr,
        sessions,
        shutdown,
    }
}

pub async fn send_text(ws: &mut Client, text: &str) {
    ws.send(Message::text(text.to_owned())).await.expect("writing text message");
}

/// Read the next text reply, failing after one second.
pub async fn next_text(ws: &mut Client) -> String {
    let message = tokio::time::timeout(Duration::from_secs(1), ws.next())
        .await
        .expect("no reply within one second")
        .expect("connection ended")
        .expect("reading reply");
    match message {
        Message::Text(text) => text.as_str().to_owned(),
        other => panic!("expected text reply, got {other:?}"),
    }
}

/// Assert nothing arrives for `wait`.
pub async fn expect_silence(ws: &mut Client, wait: Duration) {
    if let Ok(message) = tokio::time::timeout(wait, ws.next()).await {
        panic!("expected no reply, got {message:?}");
    }
}
