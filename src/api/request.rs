//! API request types
//!
//! A request is one JSON object naming its operation in `op`, with the
//! operation's arguments alongside:
//!
//! ```text
//! {"op": "findBuilderBuilds", "address": "0x34aA..."}
//! {"op": "findEventsWhere", "conditions": {"type": "build.submit,user.create"}, "limit": 10}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{ApiError, ApiResult};
use crate::model::{Build, ConfigData, Event, StreamUpdate, UpdatableStream, User};

/// Every operation name accepted in `op`
pub const OPERATIONS: &[&str] = &[
    "createUser",
    "updateUser",
    "findAllUsers",
    "findUserByAddress",
    "findAllCohorts",
    "getBuildersWithPendingEnsClaims",
    "createEvent",
    "findAllEvents",
    "findEventsWhere",
    "createBuild",
    "updateBuild",
    "deleteBuild",
    "findBuildById",
    "findAllBuilds",
    "findBuilderBuilds",
    "featureBuild",
    "addCoBuilderReferences",
    "deleteCoBuilderReferences",
    "findUpdatableStreams",
    "updateStreamData",
    "getConfigData",
    "setConfigData",
];

/// A parsed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    CreateUser {
        id: String,
        user: User,
    },
    UpdateUser {
        id: String,
        patch: Map<String, Value>,
    },
    FindAllUsers,
    FindUserByAddress {
        address: String,
    },
    FindAllCohorts,
    GetBuildersWithPendingEnsClaims,

    CreateEvent {
        event: Event,
    },
    FindAllEvents {
        #[serde(default)]
        limit: Option<usize>,
    },
    FindEventsWhere {
        #[serde(default)]
        conditions: BTreeMap<String, String>,
        #[serde(default)]
        limit: Option<usize>,
    },

    CreateBuild {
        build: Build,
    },
    UpdateBuild {
        id: String,
        patch: Map<String, Value>,
    },
    DeleteBuild {
        id: String,
    },
    FindBuildById {
        id: String,
    },
    FindAllBuilds {
        #[serde(default)]
        featured: Option<bool>,
    },
    FindBuilderBuilds {
        address: String,
    },
    FeatureBuild {
        id: String,
        featured: bool,
    },

    #[serde(rename_all = "camelCase")]
    AddCoBuilderReferences {
        build_id: String,
        co_builders: Vec<String>,
        #[serde(default)]
        submitted_timestamp: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    DeleteCoBuilderReferences {
        build_id: String,
        co_builders: Vec<String>,
    },

    FindUpdatableStreams {
        #[serde(default)]
        limit: Option<usize>,
    },
    UpdateStreamData {
        stream: UpdatableStream,
        update: StreamUpdate,
    },

    GetConfigData {
        category: String,
    },
    SetConfigData {
        category: String,
        patch: ConfigData,
    },
}

impl Request {
    /// Parse a request from a JSON string
    pub fn parse(json: &str) -> ApiResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Parse a request from a JSON value
    pub fn from_value(value: Value) -> ApiResult<Self> {
        let op = match value.get("op") {
            Some(Value::String(op)) => op.clone(),
            Some(_) => return Err(ApiError::invalid_request("op must be a string")),
            None => return Err(ApiError::invalid_request("Missing op")),
        };

        if !OPERATIONS.contains(&op.as_str()) {
            return Err(ApiError::unknown_operation(op));
        }

        serde_json::from_value(value)
            .map_err(|e| ApiError::invalid_request(format!("Invalid arguments for {}: {}", op, e)))
    }

    /// The wire name of this request's operation
    pub fn op(&self) -> &'static str {
        match self {
            Request::CreateUser { .. } => "createUser",
            Request::UpdateUser { .. } => "updateUser",
            Request::FindAllUsers => "findAllUsers",
            Request::FindUserByAddress { .. } => "findUserByAddress",
            Request::FindAllCohorts => "findAllCohorts",
            Request::GetBuildersWithPendingEnsClaims => "getBuildersWithPendingEnsClaims",
            Request::CreateEvent { .. } => "createEvent",
            Request::FindAllEvents { .. } => "findAllEvents",
            Request::FindEventsWhere { .. } => "findEventsWhere",
            Request::CreateBuild { .. } => "createBuild",
            Request::UpdateBuild { .. } => "updateBuild",
            Request::DeleteBuild { .. } => "deleteBuild",
            Request::FindBuildById { .. } => "findBuildById",
            Request::FindAllBuilds { .. } => "findAllBuilds",
            Request::FindBuilderBuilds { .. } => "findBuilderBuilds",
            Request::FeatureBuild { .. } => "featureBuild",
            Request::AddCoBuilderReferences { .. } => "addCoBuilderReferences",
            Request::DeleteCoBuilderReferences { .. } => "deleteCoBuilderReferences",
            Request::FindUpdatableStreams { .. } => "findUpdatableStreams",
            Request::UpdateStreamData { .. } => "updateStreamData",
            Request::GetConfigData { .. } => "getConfigData",
            Request::SetConfigData { .. } => "setConfigData",
        }
    }

    /// Whether the operation writes to the store
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Request::CreateUser { .. }
                | Request::UpdateUser { .. }
                | Request::CreateEvent { .. }
                | Request::CreateBuild { .. }
                | Request::UpdateBuild { .. }
                | Request::DeleteBuild { .. }
                | Request::FeatureBuild { .. }
                | Request::AddCoBuilderReferences { .. }
                | Request::DeleteCoBuilderReferences { .. }
                | Request::UpdateStreamData { .. }
                | Request::SetConfigData { .. }
        )
    }
}
