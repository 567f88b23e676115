//! The backend call template.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use reqwest::Method;
use url::Url;

use crate::config::loader::ConfigError;
use crate::config::schema::TargetSettings;
use crate::config::validation::{validate_header, validate_method, validate_url};

/// Validated, immutable description of the one backend every message goes to.
///
/// Built once at startup and shared read-only (via `Arc`) by every session.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    method: Method,
    url: Url,
    headers: BTreeMap<String, String>,
    header_map: HeaderMap,
}

impl TargetConfig {
    /// Validate and build a target. Fails on a bad method, URL or header.
    pub fn new(
        method: &str,
        url: &str,
        headers: BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();

        let method = validate_method(method).map_err(|e| errors.push(e)).ok();
        let url = validate_url(url).map_err(|e| errors.push(e)).ok();

        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in &headers {
            match validate_header(name, value) {
                Ok((name, value)) => {
                    header_map.append(name, value);
                }
                Err(e) => errors.push(e),
            }
        }

        match (method, url) {
            (Some(method), Some(url)) if errors.is_empty() => Ok(Self {
                method,
                url,
                headers,
                header_map,
            }),
            _ => Err(ConfigError::Validation(errors)),
        }
    }

    /// Build from the raw `[target]` section.
    pub fn from_settings(settings: &TargetSettings) -> Result<Self, ConfigError> {
        Self::new(&settings.method, &settings.url, settings.headers.clone())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers exactly as configured.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Headers in wire form, attached to every call.
    pub fn header_map(&self) -> &HeaderMap {
        &self.header_map
    }
}
