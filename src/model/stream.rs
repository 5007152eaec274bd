//! Builder stream records
//!
//! A stream is the `stream` sub-record of a user. Stream indexing reads
//! updatable streams, then writes back an update per stream.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::Event;

/// Stream sub-record of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    /// Contract address; empty when the user has no stream
    #[serde(default)]
    pub stream_address: String,

    /// Cap per period, decimal ether string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<String>,

    /// Period length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contract: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_indexed_block: Option<u64>,

    /// Current balance, decimal ether string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stream together with the user that owns it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatableStream {
    pub builder_address: String,

    #[serde(flatten)]
    pub stream: Stream,
}

/// New stream state produced by indexing a stream contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamUpdate {
    /// Events found while indexing, appended as-is
    #[serde(default)]
    pub events: Vec<Event>,

    pub cap: String,

    pub frequency: u64,

    /// Defaults to 0 when absent
    #[serde(default)]
    pub last_contract: Option<u64>,

    /// Last block indexed
    pub last_block: u64,

    pub balance: String,
}

impl StreamUpdate {
    /// `stream` with this update's fields applied
    pub fn apply_to(&self, stream: &Stream) -> Stream {
        Stream {
            cap: Some(self.cap.clone()),
            frequency: Some(self.frequency),
            last_contract: Some(self.last_contract.unwrap_or(0)),
            last_indexed_block: Some(self.last_block),
            balance: Some(self.balance.clone()),
            ..stream.clone()
        }
    }
}
