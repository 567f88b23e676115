//! Parsing of the `--target-headers` list.
//!
//! Format: `Name:Value` pairs separated by `|` or `,`. Separators and the
//! colon can be escaped with a backslash:
//!
//! ```text
//! Authorization:Basic 123|Referer:https\://example.com/a\,b
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::split::{split_escaped, split_escaped_any};

/// Separators between `Name:Value` pairs.
pub const PAIR_SEPARATORS: [char; 2] = ['|', ','];

/// Separator between a header name and its value.
pub const NAME_VALUE_SEPARATOR: char = ':';

/// Escape character for separators.
pub const ESCAPE: char = '\\';

/// Errors from parsing a header list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderListError {
    /// The pair did not contain exactly one unescaped colon, or had no name.
    #[error("invalid value: {0}")]
    MalformedPair(String),
}

/// Parse a header list into a name → value map.
///
/// An empty list yields an empty map. Later duplicates of a name win.
pub fn parse_headers(list: &str) -> Result<BTreeMap<String, String>, HeaderListError> {
    let mut headers = BTreeMap::new();
    if list.trim().is_empty() {
        return Ok(headers);
    }

    for pair in split_escaped_any(list, &PAIR_SEPARATORS, ESCAPE) {
        let mut kv = split_escaped(&pair, NAME_VALUE_SEPARATOR, ESCAPE);
        if kv.len() != 2 || kv[0].is_empty() {
            return Err(HeaderListError::MalformedPair(pair));
        }
        let value = kv.pop().unwrap_or_default();
        let name = kv.pop().unwrap_or_default();
        headers.insert(name, value);
    }

    Ok(headers)
}
