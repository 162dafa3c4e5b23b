//! Errors raised while fetching authoritative data.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    /// The resource could not be reached at all
    #[error("Failed to load {resource}: {reason}")]
    Unavailable { resource: String, reason: String },

    /// The resource answered with a non-success status
    #[error("Failed to load {resource}: HTTP status {status}")]
    Status { resource: String, status: u16 },

    /// The body was not a JSON array of the expected shape
    #[error("Invalid data in {resource}: {reason}")]
    Parse { resource: String, reason: String },

    /// The three fetches did not complete in time
    #[error("Data fetch timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

impl FetchError {
    /// Check if retrying later can plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Unavailable { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::Parse { .. } => false,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Unavailable { .. } | FetchError::Status { .. } => "FETCH_FAILED",
            FetchError::Parse { .. } => "INVALID_DATA",
            FetchError::Timeout { .. } => "FETCH_TIMEOUT",
        }
    }
}
