//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line flags (+ optional TOML file)
//!     → cli.rs (merge flags over file)
//!     → headers.rs / split.rs (parse the header list)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated)
//!     → bridge::TargetConfig (typed, immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod headers;
pub mod loader;
pub mod schema;
pub mod split;
pub mod validation;

pub use cli::Cli;
pub use loader::{read_config, ConfigError};
pub use schema::BridgeConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::TargetSettings;
pub use schema::TimeoutConfig;
