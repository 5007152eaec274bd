//! # Data Access Errors

use thiserror::Error;

use crate::store::StoreError;

/// Result type for data access operations
pub type DalResult<T> = Result<T, DalError>;

/// Data access errors
#[derive(Debug, Error)]
pub enum DalError {
    /// A record the operation depends on does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Caller-supplied input cannot be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store failure, passed through unchanged
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Record could not be mapped to or from a document
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DalError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable error code; store errors keep their own code
    pub fn code(&self) -> &'static str {
        match self {
            DalError::NotFound { .. } => "BUIDL_NOT_FOUND",
            DalError::InvalidInput(_) => "BUIDL_INVALID_INPUT",
            DalError::Store(e) => e.code(),
            DalError::Serialization(_) => "BUIDL_SERIALIZATION",
        }
    }
}
