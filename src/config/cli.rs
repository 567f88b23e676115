//! Command line surface.
//!
//! Flags override values from an optional `--config` file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::headers::parse_headers;
use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::BridgeConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "ws-bridge")]
#[command(about = "Bridge WebSocket text messages to HTTP requests", long_about = None)]
pub struct Cli {
    /// TOML configuration file; flags below take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g. ":80" or "127.0.0.1:8080")
    #[arg(long)]
    pub addr: Option<String>,

    /// Target URL every message is sent to
    #[arg(long)]
    pub target_url: Option<String>,

    /// HTTP method of the request sent to the target [default: GET]
    #[arg(long)]
    pub target_method: Option<String>,

    /// List of '|' separated Name:Value headers attached to target requests
    #[arg(long)]
    pub target_headers: Option<String>,

    /// Total timeout for one backend call, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Timeout for connecting to the backend, in seconds
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<String>,
}

impl Cli {
    /// Merge the config file (if any) with flags and validate the result.
    pub fn into_config(self) -> Result<BridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => BridgeConfig::default(),
        };

        if let Some(addr) = self.addr {
            config.listener.address = addr;
        }
        if let Some(url) = self.target_url {
            config.target.url = url;
        }
        if let Some(method) = self.target_method {
            config.target.method = method;
        }
        if let Some(list) = self.target_headers {
            config.target.headers.extend(parse_headers(&list)?);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeouts.request_secs = secs;
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.timeouts.connect_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(addr) = self.metrics_addr {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
