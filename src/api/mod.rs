//! Request surface for buidl-db
//!
//! Every data access operation is reachable as a JSON request naming the
//! operation in `op`. Responses are JSON envelopes.
//!
//! # Design Principles
//!
//! - One request, one data access call
//! - Error codes passed through unchanged
//! - Invalid or unknown requests never reach the store

mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiErrorCode, ApiResult};
pub use handler::RequestHandler;
pub use request::{Request, OPERATIONS};
pub use response::{ErrorResponse, Response, SuccessResponse};
