//! Error types for the tsdns system
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for tsdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the tsdns system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or placeholder values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inventory source errors
    #[error("Inventory source error: {0}")]
    Inventory(String),

    /// Record store errors
    #[error("Record store error: {0}")]
    RecordStore(String),

    /// Non-success HTTP response
    #[error("HTTP error ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or description
        message: String,
    },

    /// Authentication errors (401/403)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backup snapshot could not be written
    #[error("Backup error: {0}")]
    Backup(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an inventory source error
    pub fn inventory(msg: impl Into<String>) -> Self {
        Self::Inventory(msg.into())
    }

    /// Create a record store error
    pub fn record_store(msg: impl Into<String>) -> Self {
        Self::RecordStore(msg.into())
    }

    /// Create an HTTP error
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: msg.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a backup error
    pub fn backup(msg: impl Into<String>) -> Self {
        Self::Backup(msg.into())
    }

    /// Map a non-success HTTP status to the matching error variant.
    ///
    /// Shared by the HTTP adapters so every API reports auth, rate limit and
    /// missing-resource failures the same way.
    pub fn from_status(status: u16, context: &str, body: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!(
                "{context}: invalid API credential or insufficient permissions (status {status})"
            )),
            404 => Self::not_found(context.to_string()),
            429 => Self::rate_limited(format!("{context}: rate limit exceeded (status {status})")),
            _ => Self::http(status, format!("{context}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            Error::from_status(401, "list devices", ""),
            Error::Authentication(_)
        ));
        assert!(matches!(
            Error::from_status(403, "list devices", ""),
            Error::Authentication(_)
        ));
        assert!(matches!(
            Error::from_status(404, "list rules", ""),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_status(429, "create rule", ""),
            Error::RateLimited(_)
        ));

        let err = Error::from_status(502, "create rule", "bad gateway");
        assert_eq!(err.to_string(), "HTTP error (502): create rule: bad gateway");
    }

    #[test]
    fn json_errors_convert() {
        fn parse(text: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(text)?)
        }
        assert!(matches!(parse("{"), Err(Error::Json(_))));
    }
}
