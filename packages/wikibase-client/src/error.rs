//! Error types for the Wikibase client.

use thiserror::Error;

/// Result type for Wikibase client operations.
pub type Result<T> = std::result::Result<T, WikibaseError>;

/// Wikibase client errors.
#[derive(Debug, Error)]
pub enum WikibaseError {
    /// Transport failure (connection refused, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the API endpoint
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// The action API answered with an `error` object
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    /// Server replication lag exceeded the `maxlag` we sent
    #[error("Server lagged, retry after {retry_after:?}")]
    MaxLag { retry_after: std::time::Duration },

    /// Login did not return `Success`
    #[error("Login failed: {0}")]
    Login(String),

    /// Response did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}
