//! Typed records for the community site's collections
//!
//! Records map to and from store documents with serde (camelCase field
//! names). Fields the records do not model are carried in `extra` so a
//! read-modify-write never drops data. The document id is not part of the
//! stored body; it is folded in as `id` when a record is read.

mod build;
mod cohort;
mod event;
mod stream;
mod user;

pub use build::{Build, CoBuilderDiff, BUILD_COLLECTION};
pub use cohort::{Cohort, COHORT_COLLECTION};
pub use event::{Event, EVENT_COLLECTION};
pub use stream::{Stream, StreamUpdate, UpdatableStream};
pub use user::{BuildRef, EnsClaimData, User, UserLookup, USER_COLLECTION};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::store::DocumentSnapshot;

/// Collection holding config categories
pub const CONFIG_COLLECTION: &str = "config";

/// Arbitrary key/value bag stored per config category
pub type ConfigData = Map<String, Value>;

/// Decode a record from a snapshot, id included
pub fn from_snapshot<T: DeserializeOwned>(snapshot: DocumentSnapshot) -> serde_json::Result<T> {
    serde_json::from_value(snapshot.into_value_with_id())
}

/// Encode a record as a document body, id excluded
pub fn to_document<T: Serialize>(record: &T) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        _ => Err(<serde_json::Error as serde::ser::Error>::custom(
            "record did not serialize to a JSON object",
        )),
    }
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
