//! API response types
//!
//! `{"status":"ok","data":...}` on success,
//! `{"status":"error","code":...,"message":...}` on failure.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ApiError;

/// Success response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub status: String,
    pub data: Value,
}

impl SuccessResponse {
    pub fn new(data: Value) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }

    /// Success with `null` data
    pub fn empty() -> Self {
        Self::new(Value::Null)
    }
}

/// Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status: "error".to_string(),
            code: err.code().to_string(),
            message: err.message().to_string(),
        }
    }
}

/// Unified response type
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success(SuccessResponse::new(data))
    }

    pub fn ok() -> Self {
        Response::Success(SuccessResponse::empty())
    }

    pub fn error(err: &ApiError) -> Self {
        Response::Error(ErrorResponse::from_error(err))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Response::Success(r) => json!({"status": r.status, "data": r.data}),
            Response::Error(r) => {
                json!({"status": r.status, "code": r.code, "message": r.message})
            }
        }
    }

    /// Single-line JSON rendering
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Error code, if this is an error response
    pub fn code(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error(r) => Some(&r.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let resp = Response::success(json!([{"id": "b1"}]));
        let json = resp.to_json();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("b1"));
        assert!(resp.is_success());
    }

    #[test]
    fn test_error_response() {
        let resp = Response::error(&ApiError::invalid_request("test error"));
        assert_eq!(
            resp.to_value(),
            json!({"status": "error", "code": "BUIDL_INVALID_REQUEST", "message": "test error"})
        );
        assert_eq!(resp.code(), Some("BUIDL_INVALID_REQUEST"));
    }

    #[test]
    fn test_ok_carries_null_data() {
        assert_eq!(Response::ok().to_value(), json!({"status": "ok", "data": null}));
    }
}
