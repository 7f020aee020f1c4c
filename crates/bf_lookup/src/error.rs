//! Error types for the lookup module.

use thiserror::Error;

/// Result type alias for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Errors that can occur while resolving resources.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Lookup command not available: {0}")]
    CommandUnavailable(String),

    #[error("Lookup command failed with exit code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("Lookup timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid lookup response: {0}")]
    InvalidResponse(String),

    #[error("Lookup service error: {0}")]
    Service(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
