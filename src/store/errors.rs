//! Document store errors
//!
//! Error codes:
//! - BUIDL_STORE_NOT_FOUND
//! - BUIDL_STORE_ABORTED (precondition conflict at commit)
//! - BUIDL_STORE_INVALID_QUERY
//! - BUIDL_STORE_INVALID_DOCUMENT
//! - BUIDL_STORE_IO_ERROR
//! - BUIDL_STORE_SERIALIZATION
//! - BUIDL_STORE_INTERNAL

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a [`DocumentStore`](super::DocumentStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Target document does not exist (update on a missing document)
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A transaction precondition no longer holds
    #[error("Transaction aborted: {0}")]
    Aborted(String),

    /// Query cannot be executed as composed
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Document body is not a JSON object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Backing file could not be read or written
    #[error("I/O error: {0}")]
    Io(String),

    /// Backing file content could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store state is unusable (poisoned lock)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "BUIDL_STORE_NOT_FOUND",
            StoreError::Aborted(_) => "BUIDL_STORE_ABORTED",
            StoreError::InvalidQuery(_) => "BUIDL_STORE_INVALID_QUERY",
            StoreError::InvalidDocument(_) => "BUIDL_STORE_INVALID_DOCUMENT",
            StoreError::Io(_) => "BUIDL_STORE_IO_ERROR",
            StoreError::Serialization(_) => "BUIDL_STORE_SERIALIZATION",
            StoreError::Internal(_) => "BUIDL_STORE_INTERNAL",
        }
    }

    /// Whether the failed operation may succeed if re-run from scratch
    pub fn is_contention(&self) -> bool {
        matches!(self, StoreError::Aborted(_))
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            StoreError::not_found("users", "0x1").code(),
            "BUIDL_STORE_NOT_FOUND"
        );
        assert_eq!(
            StoreError::Aborted("stale".into()).code(),
            "BUIDL_STORE_ABORTED"
        );
    }

    #[test]
    fn test_only_aborted_is_contention() {
        assert!(StoreError::Aborted("x".into()).is_contention());
        assert!(!StoreError::Io("x".into()).is_contention());
        assert!(!StoreError::not_found("a", "b").is_contention());
    }

    #[test]
    fn test_display_names_document() {
        let err = StoreError::not_found("builds", "abc");
        assert_eq!(err.to_string(), "Document not found: builds/abc");
    }
}
