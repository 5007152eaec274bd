//! Cohort records (read-only reference list)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection name for cohorts
pub const COHORT_COLLECTION: &str = "cohorts";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
