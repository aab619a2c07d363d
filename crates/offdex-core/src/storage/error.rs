//! Storage error types

use thiserror::Error;

/// Errors that can occur during object store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Opening or creating the database failed
    #[error("failed to open store: {0}")]
    Open(String),

    /// A read or write transaction failed or was aborted
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Record is not a JSON object or lacks a string key field
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Attempted to change or remove the key field of a stored record
    #[error("key field '{0}' is immutable")]
    KeyFieldImmutable(String),

    /// Caller passed an unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
