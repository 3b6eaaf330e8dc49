//! Twitter client error types.
//!
//! API-level failures (a non-success status with a readable body) are not
//! errors here; they resolve into [`crate::ResponseResult::Error`]. This type
//! only covers failures that prevent a result from being produced at all.

use thiserror::Error;

/// Twitter client errors.
#[derive(Error, Debug)]
pub enum TwitterError {
    /// Transport failure (DNS, connection reset, timeout, unreadable body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A body that had to be JSON was not, or a payload did not match the
    /// requested type
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Signing failed (unparseable URL, clock before the epoch)
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Parameters could not be flattened into a query string or form body
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Missing or malformed settings, or a header value that cannot be sent
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TwitterError {
    /// Whether this error came from the transport layer rather than from
    /// request construction or response decoding.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Result alias used throughout the crate.
pub type TwitterResult<T> = Result<T, TwitterError>;
