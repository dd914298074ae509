//! Error types for the store
//!
//! Every repository operation returns [`StoreError`]. Callers are expected to
//! render [`StoreError::NotFound`] as a 404 and [`StoreError::Storage`] as a 500,
//! logging the full source chain.

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Main error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Zero rows matched a lookup
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A write collided with an existing row holding different content
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation would break a storage invariant
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Backend I/O or constraint failure
    #[error("Storage error: {0}")]
    Storage(#[source] sqlx::Error),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema initialization or reset is already running
    #[error("Operation already in progress: {0}")]
    AlreadyInProgress(&'static str),
}

impl StoreError {
    /// Create a new NotFound error with context
    pub fn not_found(context: impl Into<String>) -> Self {
        StoreError::NotFound(context.into())
    }

    /// Create a new Conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }

    /// Create a new InvalidState error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        StoreError::InvalidState(msg.into())
    }

    /// Create a new Config error
    pub fn config(msg: impl Into<String>) -> Self {
        StoreError::Config(msg.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    /// Check if this is a backend failure
    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                StoreError::NotFound("No matching row found in database".to_string())
            }
            err => StoreError::Storage(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_not_found_error() {
        let err = StoreError::not_found("agent a1");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_row_not_found_conversion() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let err: StoreError = sqlx::Error::PoolClosed.into();
        assert!(err.is_storage());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_serialization_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
