//! HTTP server setup and the upgrade entry point.
//!
//! # Responsibilities
//! - Create Axum Router; every path and method is an upgrade candidate
//! - Wire up middleware (tracing)
//! - Log and answer failed handshakes without creating a session
//! - Spawn one `Session` per upgraded connection

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::backend::BackendCaller;
use crate::http::websocket::Session;
use crate::net::SessionTracker;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub caller: Arc<BackendCaller>,
    pub sessions: SessionTracker,
}

/// WebSocket → HTTP bridge server.
pub struct BridgeServer {
    router: Router,
    sessions: SessionTracker,
}

impl BridgeServer {
    /// Create a server forwarding every message through `caller`.
    pub fn new(caller: Arc<BackendCaller>) -> Self {
        let sessions = SessionTracker::new();
        let state = AppState {
            caller,
            sessions: sessions.clone(),
        };
        Self {
            router: Self::build_router(state),
            sessions,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(upgrade_handler))
            .route("/", any(upgrade_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Live session accounting.
    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Sessions already running are not waited for.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Bridge listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Bridge stopped");
        Ok(())
    }
}

/// Upgrade every incoming request and hand the socket to a new session.
async fn upgrade_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(peer = %peer, error = %rejection, "Failed to upgrade connection");
            metrics::upgrade_failed();
            return rejection.into_response();
        }
    };

    ws.on_failed_upgrade(move |e: axum::Error| {
        tracing::warn!(peer = %peer, error = %e, "Failed to upgrade connection");
        metrics::upgrade_failed();
    })
    .on_upgrade(move |socket: WebSocket| async move {
        let guard = state.sessions.track();
        tracing::info!(peer = %peer, session_id = %guard.id(), "Connection upgraded");
        Session::new(socket, state.caller, guard).run().await;
    })
}
