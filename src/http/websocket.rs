//! Per-connection bridging loop.
//!
//! # Data Flow
//! ```text
//! Client ── text frame ──→ Session ── HTTP request ──→ Backend
//! Client ←── text frame ── Session ←── response body ── Backend
//! ```
//!
//! # Design Decisions
//! - Strictly sequential: the next frame is not read until the reply is written
//! - Non-text frames (binary, ping, pong) are skipped, never forwarded
//! - Backend failures are replied as text; only transport errors end a session
//! - A close frame ends the session like a read error

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::SinkExt;
use tracing::Instrument;

use crate::backend::BackendCaller;
use crate::net::{SessionGuard, SessionId};
use crate::observability::metrics;

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The transport returned an error while reading.
    ReadFailed(axum::Error),
    /// The peer sent a close frame.
    CloseFrame(Option<CloseFrame>),
    /// The stream ended without a close frame.
    Disconnected,
    /// Writing a reply failed.
    WriteFailed(axum::Error),
}

impl std::fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEnd::ReadFailed(e) => write!(f, "failed to read message: {}", e),
            SessionEnd::CloseFrame(Some(frame)) => {
                write!(f, "peer closed: code {} {}", frame.code, frame.reason.as_str())
            }
            SessionEnd::CloseFrame(None) => write!(f, "peer closed"),
            SessionEnd::Disconnected => write!(f, "peer disconnected"),
            SessionEnd::WriteFailed(e) => write!(f, "failed to write message: {}", e),
        }
    }
}

/// One upgraded connection and the loop that serves it.
pub struct Session {
    socket: WebSocket,
    caller: Arc<BackendCaller>,
    guard: SessionGuard,
}

impl Session {
    pub fn new(socket: WebSocket, caller: Arc<BackendCaller>, guard: SessionGuard) -> Self {
        Self {
            socket,
            caller,
            guard,
        }
    }

    pub fn id(&self) -> SessionId {
        self.guard.id()
    }

    /// Run until the connection fails, then close it.
    pub async fn run(self) -> SessionEnd {
        let span = tracing::info_span!("session", id = %self.id());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> SessionEnd {
        tracing::debug!("Session started");

        let end = self.serve().await;
        match &end {
            SessionEnd::ReadFailed(_) | SessionEnd::WriteFailed(_) => {
                tracing::warn!(reason = %end, "Session ended")
            }
            _ => tracing::info!(reason = %end, "Session ended"),
        }

        if let Err(e) = SinkExt::close(&mut self.socket).await {
            tracing::trace!(error = %e, "Close after session end failed");
        }
        end
    }

    async fn serve(&mut self) -> SessionEnd {
        loop {
            let message = match self.socket.recv().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return SessionEnd::ReadFailed(e),
                None => return SessionEnd::Disconnected,
            };

            let payload = match message {
                Message::Text(text) => Bytes::from(text),
                Message::Close(frame) => return SessionEnd::CloseFrame(frame),
                other => {
                    let kind = frame_kind(&other);
                    tracing::debug!(kind, "Not a text message, skipping");
                    metrics::frame_skipped(kind);
                    continue;
                }
            };

            let reply = process(&self.caller, payload).await;

            if let Err(e) = self.socket.send(Message::Text(reply.into())).await {
                return SessionEnd::WriteFailed(e);
            }
        }
    }
}

/// Forward one payload and produce the reply text.
async fn process(caller: &BackendCaller, payload: Bytes) -> String {
    tracing::info!(len = payload.len(), "Incoming message");
    let start = Instant::now();

    match caller.call(payload).await {
        Ok(body) => {
            metrics::record_message("ok", start);
            String::from_utf8_lossy(&body).into_owned()
        }
        Err(e) => {
            metrics::record_message("error", start);
            tracing::warn!(phase = %e.phase(), error = %e, "Backend call failed");
            e.report()
        }
    }
}

fn frame_kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
    }
}
