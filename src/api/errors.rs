//! API error types
//!
//! API errors are pass-through: data access and store failures keep the
//! code they were raised with. Only request-shape problems get an API code.

use std::fmt;

use crate::dal::DalError;

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Request is not valid JSON or its arguments do not fit the operation
    InvalidRequest,
    /// `op` names no known operation
    UnknownOperation,
}

impl ApiErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest => "BUIDL_INVALID_REQUEST",
            ApiErrorCode::UnknownOperation => "BUIDL_UNKNOWN_OPERATION",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error carrying the originating error code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    code: String,
    message: String,
}

impl ApiError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::InvalidRequest.code().to_string(),
            message: reason.into(),
        }
    }

    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::UnknownOperation.code().to_string(),
            message: format!("Unknown operation: {}", op.into()),
        }
    }

    /// Create from a data access error (pass-through)
    pub fn from_dal_error(err: DalError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DalError> for ApiError {
    fn from(err: DalError) -> Self {
        Self::from_dal_error(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_invalid_request_error() {
        let err = ApiError::invalid_request("missing field");
        assert_eq!(err.code(), "BUIDL_INVALID_REQUEST");
        assert_eq!(err.to_string(), "BUIDL_INVALID_REQUEST: missing field");
    }

    #[test]
    fn test_unknown_operation_error() {
        let err = ApiError::unknown_operation("foo");
        assert_eq!(err.code(), "BUIDL_UNKNOWN_OPERATION");
        assert!(err.message().contains("foo"));
    }

    #[test]
    fn test_dal_codes_pass_through() {
        let err = ApiError::from(DalError::not_found("build", "b1"));
        assert_eq!(err.code(), "BUIDL_NOT_FOUND");

        let err = ApiError::from(DalError::from(StoreError::Aborted("conflict".into())));
        assert_eq!(err.code(), "BUIDL_STORE_ABORTED");
    }
}
