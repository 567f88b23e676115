//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into the shared target and backend caller
//! - Install the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::backend::{BackendCaller, TargetConfig};
use crate::config::{BridgeConfig, ConfigError};
use crate::http::BridgeServer;
use crate::observability::metrics;

/// Errors that stop the process before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("building backend client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed listening on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("installing metrics exporter: {0}")]
    Metrics(String),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the bridge server described by `config`.
pub fn build_server(config: &BridgeConfig) -> Result<BridgeServer, StartupError> {
    let target = TargetConfig::from_settings(&config.target)?;
    let caller = BackendCaller::new(Arc::new(target), &config.timeouts)?;

    let target = caller.target();
    tracing::info!(
        method = %target.method(),
        url = %target.url(),
        headers = target.headers().len(),
        "Target configured"
    );

    Ok(BridgeServer::new(Arc::new(caller)))
}

/// Bind the configured listen address.
pub async fn bind(config: &BridgeConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

/// Start everything and serve until `shutdown` resolves.
pub async fn run<F>(config: BridgeConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let server = build_server(&config)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let listener = bind(&config).await?;
    server.run(listener, shutdown).await.map_err(StartupError::Serve)
}
