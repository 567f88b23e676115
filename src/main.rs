//! WebSocket to HTTP bridge.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                    BRIDGE                    │
//!                         │                                              │
//!   WebSocket client      │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!   ── text frame ────────┼─▶│  http    │──▶│ session  │──▶│ backend  │──┼──▶ HTTP target
//!                         │  │ upgrade  │   │  loop    │   │  caller  │  │
//!   ◀── text frame ───────┼──│          │◀──│          │◀──│          │◀─┼─── response body
//!                         │  └──────────┘   └──────────┘   └──────────┘  │
//!                         │                                              │
//!                         │   config · observability · lifecycle         │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use ws_bridge::config::Cli;
use ws_bridge::lifecycle::{signals::shutdown_signal, startup};
use ws_bridge::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let fallback_level = cli.log_level.clone().unwrap_or_else(|| "info".to_string());

    let config = cli.into_config();
    logging::init_logging(
        config
            .as_ref()
            .map(|c| c.observability.log_level.as_str())
            .unwrap_or(fallback_level.as_str()),
    );

    tracing::info!("ws-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "fatal error: parsing configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        listen_address = %config.listener.address,
        target_url = %config.target.url,
        target_method = %config.target.method,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if let Err(e) = startup::run(config, shutdown_signal()).await {
        tracing::error!(error = %e, "fatal error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
