//! Event records
//!
//! Events are append-only; the `type` field is the discriminator filters
//! run against (for example `build.submit`, `stream.withdraw`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection name for events
pub const EVENT_COLLECTION: &str = "events";

/// Event document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Generated document id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    #[serde(default)]
    pub payload: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, timestamp: i64, payload: Value) -> Self {
        Self {
            id: String::new(),
            event_type: event_type.into(),
            timestamp,
            payload,
            extra: Map::new(),
        }
    }
}
