//! Error taxonomy for tracker calls.
//!
//! Authentication failures are distinct from not-found and rate-limit
//! failures: auth is fatal before any mutation, the others surface per call.

use thiserror::Error;

/// Errors that can occur talking to the ticket tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Token invalid, expired, or lacking permissions (401 / 403).
    #[error("tracker authentication failed: {0}")]
    Auth(String),

    /// Referenced repository or ticket does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// API rate limit exhausted (429, or 403 with a rate-limit body).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other HTTP or transport failure.
    #[error("tracker request failed: {0}")]
    Http(String),

    /// Response body could not be decoded.
    #[error("failed to parse tracker response: {0}")]
    Parse(String),
}

impl TrackerError {
    /// Whether this error should abort a run before any mutation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TrackerError::Auth(_))
    }
}
