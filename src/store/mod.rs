//! Document store abstraction
//!
//! Documents live in named collections and are addressed by
//! `collection/id`. A store supports point reads, composed queries and
//! atomic write batches; single-document writes are one-write batches.
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore::new`]: in-process, nothing persisted
//! - [`MemoryStore::open`]: in-process, every commit snapshotted to a file
//!
//! Multi-document changes go through [`Transaction`], which records the
//! version of every document it reads and commits its writes with those
//! versions as preconditions.

mod batch;
mod errors;
mod filter;
mod memory;
mod path;
mod query;
pub mod seed;
mod snapshot;
mod transaction;

pub use batch::{Precondition, Write, WriteBatch};
pub use errors::{StoreError, StoreResult};
pub use filter::{compare_values, FilterExpr, FilterOperator};
pub use memory::MemoryStore;
pub use path::{apply_merge_patch, resolve, set_path, FIELD_PATH_SEPARATOR};
pub use query::{OrderBy, Query, SortDirection, MAX_IN_VALUES};
pub use snapshot::{CollectionsDump, SnapshotFile};
pub use transaction::Transaction;

use serde_json::{Map, Value};
use uuid::Uuid;

/// A document as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document id within its collection
    pub id: String,
    /// Document body
    pub data: Map<String, Value>,
    /// Commit version of the last write to this document
    pub version: u64,
}

impl DocumentSnapshot {
    /// Body with the id folded in as an `id` field
    pub fn into_value_with_id(self) -> Value {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        Value::Object(data)
    }
}

/// Trait for document store backends
pub trait DocumentStore: Send + Sync {
    /// Read a document by id
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>>;

    /// Run a query
    fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Atomically check preconditions and apply writes
    fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Create or overwrite a document
    fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(collection, id, data);
        self.commit(batch)
    }

    /// Create a document under a generated id
    fn add(&self, collection: &str, data: Map<String, Value>) -> StoreResult<String> {
        let id = generate_id();
        self.set(collection, &id, data)?;
        Ok(id)
    }

    /// Merge-patch an existing document
    fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(collection, id, patch);
        self.commit(batch)
    }

    /// Delete a document; deleting a missing document succeeds
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(collection, id);
        self.commit(batch)
    }
}

/// Generate a new document id
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Require a JSON value to be a map, as every document body is
pub fn into_document(value: Value) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_into_document_rejects_non_objects() {
        assert!(into_document(json!({"a": 1})).is_ok());
        let err = into_document(json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), "BUIDL_STORE_INVALID_DOCUMENT");
    }

    #[test]
    fn test_snapshot_folds_id() {
        let snap = DocumentSnapshot {
            id: "0x1".into(),
            data: json!({"builds": []}).as_object().cloned().unwrap(),
            version: 4,
        };
        assert_eq!(snap.into_value_with_id(), json!({"id": "0x1", "builds": []}));
    }
}
