//! Error types for call platform operations.

use thiserror::Error;

/// Errors that can occur while talking to the voice-call platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request to the call gateway failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned a non-success HTTP status.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// Gateway reported a platform-level failure (e.g. no active voice chat).
    #[error("{0}")]
    Rejected(String),

    /// Response body could not be decoded.
    #[error("Failed to decode gateway response: {0}")]
    Decode(String),
}

/// Convenient Result alias for call platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

impl PlatformError {
    /// Returns `true` if the gateway answered 404 (unknown group, member or call).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus(404, _))
    }
}
