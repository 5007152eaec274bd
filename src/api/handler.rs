//! Request handler
//!
//! Parses a request, dispatches it to the data access layer and wraps the
//! outcome in a [`Response`]. Every request is logged on entry and exit.

use serde::Serialize;
use serde_json::{json, Value};

use crate::dal::DataAccess;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{ApiError, ApiResult};
use super::request::Request;
use super::response::Response;

/// Dispatches requests to a [`DataAccess`] service
#[derive(Clone)]
pub struct RequestHandler {
    dal: DataAccess,
}

impl RequestHandler {
    pub fn new(dal: DataAccess) -> Self {
        Self { dal }
    }

    pub fn dal(&self) -> &DataAccess {
        &self.dal
    }

    /// Handle a raw JSON request string
    pub fn handle(&self, json_request: &str) -> Response {
        match Request::parse(json_request) {
            Ok(request) => self.handle_request(request),
            Err(e) => self.reject(&e),
        }
    }

    /// Handle a request already parsed as JSON
    pub fn handle_value(&self, value: Value) -> Response {
        match Request::from_value(value) {
            Ok(request) => self.handle_request(request),
            Err(e) => self.reject(&e),
        }
    }

    /// Handle a typed request
    pub fn handle_request(&self, request: Request) -> Response {
        let op = request.op();
        let mutation = if request.is_mutation() { "true" } else { "false" };
        log_event_with_fields(Event::RequestReceived, &[("op", op), ("mutation", mutation)]);

        match self.dispatch(request) {
            Ok(data) => {
                log_event_with_fields(Event::RequestCompleted, &[("op", op)]);
                Response::success(data)
            }
            Err(e) => {
                log_event_with_fields(
                    Event::RequestRejected,
                    &[("op", op), ("code", e.code()), ("message", e.message())],
                );
                Response::error(&e)
            }
        }
    }

    fn reject(&self, err: &ApiError) -> Response {
        log_event_with_fields(
            Event::RequestRejected,
            &[("code", err.code()), ("message", err.message())],
        );
        Response::error(err)
    }

    fn dispatch(&self, request: Request) -> ApiResult<Value> {
        let dal = &self.dal;

        match request {
            Request::CreateUser { id, user } => {
                dal.create_user(&id, &user)?;
                Ok(json!({"id": id}))
            }
            Request::UpdateUser { id, patch } => to_data(&dal.update_user(&id, patch)?),
            Request::FindAllUsers => to_data(&dal.find_all_users()?),
            Request::FindUserByAddress { address } => {
                to_data(&dal.find_user_by_address(&address)?)
            }
            Request::FindAllCohorts => to_data(&dal.find_all_cohorts()?),
            Request::GetBuildersWithPendingEnsClaims => {
                to_data(&dal.get_builders_with_pending_ens_claims()?)
            }

            Request::CreateEvent { event } => {
                let id = dal.create_event(&event)?;
                Ok(json!({"id": id}))
            }
            Request::FindAllEvents { limit } => to_data(&dal.find_all_events(limit)?),
            Request::FindEventsWhere { conditions, limit } => {
                to_data(&dal.find_events_where(&conditions, limit)?)
            }

            Request::CreateBuild { build } => {
                let id = dal.create_build(build)?;
                Ok(json!({"id": id}))
            }
            Request::UpdateBuild { id, patch } => to_data(&dal.update_build(&id, patch)?),
            Request::DeleteBuild { id } => {
                dal.delete_build(&id)?;
                Ok(Value::Null)
            }
            Request::FindBuildById { id } => to_data(&dal.find_build_by_id(&id)?),
            Request::FindAllBuilds { featured } => to_data(&dal.find_all_builds(featured)?),
            Request::FindBuilderBuilds { address } => {
                to_data(&dal.find_builder_builds(&address)?)
            }
            Request::FeatureBuild { id, featured } => {
                dal.feature_build(&id, featured)?;
                Ok(Value::Null)
            }

            Request::AddCoBuilderReferences {
                build_id,
                co_builders,
                submitted_timestamp,
            } => {
                dal.add_co_builder_references(&build_id, &co_builders, submitted_timestamp)?;
                Ok(Value::Null)
            }
            Request::DeleteCoBuilderReferences {
                build_id,
                co_builders,
            } => {
                dal.delete_co_builder_references(&build_id, &co_builders)?;
                Ok(Value::Null)
            }

            Request::FindUpdatableStreams { limit } => {
                to_data(&dal.find_updatable_streams(limit)?)
            }
            Request::UpdateStreamData { stream, update } => {
                dal.update_stream_data(&stream, &update)?;
                Ok(Value::Null)
            }

            Request::GetConfigData { category } => to_data(&dal.get_config_data(&category)?),
            Request::SetConfigData { category, patch } => {
                to_data(&dal.set_config_data(&category, patch)?)
            }
        }
    }
}

fn to_data<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::invalid_request(format!("Failed to serialize result: {}", e)))
}
