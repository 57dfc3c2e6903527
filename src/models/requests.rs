//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query for the invalidation endpoint (DELETE /cache)
///
/// Without a prefix every entry and pending fetch is dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateRequest {
    /// Only remove keys starting with this prefix
    #[serde(default)]
    pub prefix: Option<String>,
}

impl InvalidateRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match &self.prefix {
            Some(prefix) if prefix.is_empty() => Some("Prefix cannot be empty".to_string()),
            _ => None,
        }
    }
}
