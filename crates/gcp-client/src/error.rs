//! GCP client errors

use thiserror::Error;

/// Errors that can occur when querying the Compute Engine API
#[derive(Debug, Error)]
pub enum GcpError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Compute API returned a non-success status
    #[error("GCP API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Access token rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Project or collection not found
    #[error("Not found: {0}")]
    NotFound(String),
}
