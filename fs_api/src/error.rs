//! Filesystem service error types

use core_types::PathError;
use thiserror::Error;

/// Result alias used across the filesystem layers
pub type FsResult<T> = Result<T, FsError>;

/// Outcome of a failed filesystem request
///
/// Variants classify the failure by outcome, not by where it came from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsError {
    /// Path or archive does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Path already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Archive or file does not permit the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Archive has no room for the data
    #[error("No space left in archive")]
    NoSpace,

    /// Generic transport or service failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed path, size or archive path
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Service is not running or the session was released
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Archive or file handle is unknown or already closed
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
}

impl From<PathError> for FsError {
    fn from(error: PathError) -> Self {
        FsError::InvalidArgument(error.to_string())
    }
}
