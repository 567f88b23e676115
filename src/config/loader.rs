//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::headers::HeaderListError;
use crate::config::schema::BridgeConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("parsing headers: {0}")]
    Headers(#[from] HeaderListError),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

impl From<ValidationError> for ConfigError {
    fn from(error: ValidationError) -> Self {
        ConfigError::Validation(vec![error])
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a TOML file into a configuration without validating it.
///
/// The file is only the base layer; command line overrides go on top and
/// the merged result is validated by [`Cli::into_config`](crate::config::Cli::into_config).
pub fn read_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BridgeConfig = toml::from_str(&content)?;
    Ok(config)
}
