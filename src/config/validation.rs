//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the target URL is absolute and HTTP(S)
//! - Check method and headers are representable on the wire
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listen address cannot be empty")]
    EmptyListenAddress,

    #[error("target url cannot be empty")]
    EmptyTargetUrl,

    #[error("invalid target url '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("unsupported target url scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    #[error("target method cannot be empty")]
    EmptyMethod,

    #[error("invalid target method '{0}'")]
    InvalidMethod(String),

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.trim().is_empty() {
        errors.push(ValidationError::EmptyListenAddress);
    }

    let target = &config.target;
    if let Err(e) = validate_url(&target.url) {
        errors.push(e);
    }
    if let Err(e) = validate_method(&target.method) {
        errors.push(e);
    }
    for (name, value) in &target.headers {
        if let Err(e) = validate_header(name, value) {
            errors.push(e);
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse and check a target URL.
pub fn validate_url(raw: &str) -> Result<Url, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyTargetUrl);
    }
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidTargetUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
}

/// Parse and check a target method.
pub fn validate_method(raw: &str) -> Result<Method, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyMethod);
    }
    Method::from_bytes(raw.as_bytes()).map_err(|_| ValidationError::InvalidMethod(raw.to_string()))
}

/// Parse and check a single static header.
pub fn validate_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    Ok((header_name, header_value))
}
