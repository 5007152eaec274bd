//! Build records

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::null_as_default;

/// Collection name for builds
pub const BUILD_COLLECTION: &str = "builds";

/// Build document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    /// Generated document id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Owning user id
    pub builder: String,

    /// Secondary contributors; order is kept but carries no meaning
    #[serde(default, deserialize_with = "null_as_default")]
    pub co_builders: Vec<String>,

    #[serde(default)]
    pub featured: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_timestamp: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Co-builders added and removed between two co-builder lists.
///
/// Both lists are compared as sets; each result keeps the order in which
/// ids first appear in its source list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoBuilderDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl CoBuilderDiff {
    pub fn between(existing: &[String], incoming: &[String]) -> Self {
        let existing_set: BTreeSet<&str> = existing.iter().map(String::as_str).collect();
        let incoming_set: BTreeSet<&str> = incoming.iter().map(String::as_str).collect();

        Self {
            added: distinct_not_in(incoming, &existing_set),
            removed: distinct_not_in(existing, &incoming_set),
        }
    }

    /// True when both lists hold the same set of ids
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

fn distinct_not_in(source: &[String], exclude: &BTreeSet<&str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    source
        .iter()
        .filter(|id| !exclude.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect()
}
