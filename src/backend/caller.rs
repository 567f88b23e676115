//! One message in, one backend call out.
//!
//! # Responsibilities
//! - Build the request from the fixed target (method, URL, static headers)
//! - Send it with the message payload as body
//! - Read the whole response body, whatever the status code
//! - Tag every failure with the phase that failed
//!
//! # Design Decisions
//! - Single attempt per message; no retry, no backoff
//! - Timeouts live in the client; a timeout surfaces as a send failure
//! - No status-code branching: a 500 body is returned like a 200 body

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use thiserror::Error;

use crate::backend::target::TargetConfig;
use crate::config::schema::TimeoutConfig;

/// Step of a backend call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Build,
    Send,
    ReadBody,
}

impl CallPhase {
    /// Prefix used in the error text sent back to the client.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallPhase::Build => "initializing new request",
            CallPhase::Send => "sending request",
            CallPhase::ReadBody => "reading body",
        }
    }
}

impl std::fmt::Display for CallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed backend call.
///
/// The display form starts with the phase, e.g. `sending request: ...`.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("initializing new request: {0}")]
    Build(#[source] reqwest::Error),

    #[error("sending request: {0}")]
    Send(#[source] reqwest::Error),

    #[error("reading body: {0}")]
    ReadBody(#[source] reqwest::Error),
}

impl CallError {
    pub fn phase(&self) -> CallPhase {
        match self {
            CallError::Build(_) => CallPhase::Build,
            CallError::Send(_) => CallPhase::Send,
            CallError::ReadBody(_) => CallPhase::ReadBody,
        }
    }

    fn cause(&self) -> &reqwest::Error {
        match self {
            CallError::Build(e) | CallError::Send(e) | CallError::ReadBody(e) => e,
        }
    }

    /// The error text followed by every underlying cause, `: `-separated.
    ///
    /// This is what the client receives in place of a backend body.
    pub fn report(&self) -> String {
        let mut text = self.to_string();
        let mut source = std::error::Error::source(self.cause());
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }
}

/// Issues backend calls for the configured target.
///
/// Shared by all sessions; `reqwest::Client` pools connections internally.
#[derive(Debug, Clone)]
pub struct BackendCaller {
    target: Arc<TargetConfig>,
    client: reqwest::Client,
}

impl BackendCaller {
    /// Create a caller with a client honouring `timeouts`.
    pub fn new(target: Arc<TargetConfig>, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()?;
        Ok(Self::with_client(target, client))
    }

    /// Create a caller around an existing client.
    pub fn with_client(target: Arc<TargetConfig>, client: reqwest::Client) -> Self {
        Self { target, client }
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    /// Send `payload` to the target and return the response body.
    pub async fn call(&self, payload: impl Into<Bytes>) -> Result<Bytes, CallError> {
        let request = self
            .client
            .request(self.target.method().clone(), self.target.url().clone())
            .headers(self.target.header_map().clone())
            .body(payload.into())
            .build()
            .map_err(CallError::Build)?;

        let response = self.client.execute(request).await.map_err(CallError::Send)?;

        tracing::debug!(status = %response.status(), "Backend responded");

        response.bytes().await.map_err(CallError::ReadBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::net::SocketAddr;

    use axum::{
        http::{HeaderMap, StatusCode},
        routing::any,
        Router,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Answer every request with fewer body bytes than `Content-Length` promises.
    async fn serve_truncated() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    drain_request(&mut stream).await;
                    let _ = stream
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                        .await;
                });
            }
        });
        addr
    }

    async fn drain_request(stream: &mut TcpStream) {
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

    fn caller(method: &str, addr: SocketAddr, headers: BTreeMap<String, String>) -> BackendCaller {
        let target = TargetConfig::new(method, &format!("http://{addr}/hook"), headers).unwrap();
        BackendCaller::new(Arc::new(target), &TimeoutConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn forwards_payload_method_and_headers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = Router::new().route(
            "/hook",
            any(move |method: axum::http::Method, headers: HeaderMap, body: String| {
                let tx = tx.clone();
                async move {
                    tx.send((method, headers, body)).unwrap();
                    "ack"
                }
            }),
        );
        let addr = serve(router).await;

        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Basic 123".to_string());
        headers.insert("X-Static".to_string(), "yes".to_string());
        let caller = caller("POST", addr, headers);

        let body = caller.call("{\"hello\":\"there\"}").await.unwrap();
        assert_eq!(&body[..], b"ack");

        let (method, seen, payload) = rx.recv().await.unwrap();
        assert_eq!(method, axum::http::Method::POST);
        assert_eq!(seen["authorization"], "Basic 123");
        assert_eq!(seen["x-static"], "yes");
        assert_eq!(payload, "{\"hello\":\"there\"}");
    }

    #[tokio::test]
    async fn error_status_body_is_returned_as_success() {
        let router = Router::new().route(
            "/hook",
            any(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = serve(router).await;

        let body = caller("GET", addr, BTreeMap::new()).call("x").await.unwrap();
        assert_eq!(&body[..], b"boom");
    }

    #[tokio::test]
    async fn unreachable_backend_is_send_failure() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = caller("GET", addr, BTreeMap::new()).call("x").await.unwrap_err();
        assert_eq!(err.phase(), CallPhase::Send);
        assert!(err.to_string().starts_with("sending request"), "got: {err}");
        assert!(err.report().starts_with(&err.to_string()));
    }

    #[tokio::test]
    async fn slow_backend_times_out_as_send_failure() {
        let router = Router::new().route(
            "/hook",
            any(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let addr = serve(router).await;

        let target = TargetConfig::new("GET", &format!("http://{addr}/hook"), BTreeMap::new()).unwrap();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let caller = BackendCaller::with_client(Arc::new(target), client);

        let err = caller.call("x").await.unwrap_err();
        assert_eq!(err.phase(), CallPhase::Send);
    }

    #[tokio::test]
    async fn truncated_body_is_read_failure() {
        let addr = serve_truncated().await;

        let err = caller("POST", addr, BTreeMap::new()).call("x").await.unwrap_err();
        assert_eq!(err.phase(), CallPhase::ReadBody);
        assert!(err.report().starts_with("reading body"), "got: {}", err.report());
    }

    #[test]
    fn phase_prefixes() {
        assert_eq!(CallPhase::Build.to_string(), "initializing new request");
        assert_eq!(CallPhase::Send.to_string(), "sending request");
        assert_eq!(CallPhase::ReadBody.to_string(), "reading body");
    }
}
