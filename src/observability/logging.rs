//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level comes from config; `RUST_LOG` takes precedence when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives for a configured level.
pub fn default_directives(level: &str) -> String {
    format!("ws_bridge={level},tower_http={level}")
}

/// Install the global tracing subscriber.
///
/// Must be called at most once per process.
pub fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_crate_and_http_layer() {
        assert_eq!(default_directives("debug"), "ws_bridge=debug,tower_http=debug");
    }
}
