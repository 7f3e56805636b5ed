//! Error types for the odds client

use thiserror::Error;

/// Errors that can occur when talking to the odds provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OddsError {
    /// No usable API key configured
    #[error("No odds API key configured")]
    MissingApiKey,

    /// HTTP request failed (connection, TLS, timeout)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body did not match the expected schema
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - request quota used up
    #[error("Rate limited - request quota exhausted")]
    RateLimited,

    /// Unauthorized - invalid API key
    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    /// Unknown sport or event
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}
