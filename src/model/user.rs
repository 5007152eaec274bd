//! User records
//!
//! Users are keyed by their (address-derived) id and carry the
//! back-references to every build they own or co-build.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::null_as_default;
use super::stream::Stream;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// Back-reference from a user to a build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRef {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_timestamp: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildRef {
    pub fn new(id: impl Into<String>, submitted_timestamp: Option<i64>) -> Self {
        Self {
            id: id.into(),
            submitted_timestamp,
            extra: Map::new(),
        }
    }
}

/// ENS claim state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsClaimData {
    #[serde(default)]
    pub provided: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document id (the user's address)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Builds this user owns or co-builds, in insertion order
    #[serde(default, deserialize_with = "null_as_default")]
    pub builds: Vec<BuildRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<Stream>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ens_claim_data: Option<EnsClaimData>,

    /// Hidden from listings when set
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Whether `builds` holds a reference to `build_id`
    pub fn references(&self, build_id: &str) -> bool {
        self.builds.iter().any(|r| r.id == build_id)
    }
}

/// Result of looking a user up by address.
///
/// Absence is an answer, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLookup {
    pub exists: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<User>,
}

impl UserLookup {
    pub fn found(user: User) -> Self {
        Self {
            exists: true,
            data: Some(user),
        }
    }

    pub fn missing() -> Self {
        Self {
            exists: false,
            data: None,
        }
    }
}
