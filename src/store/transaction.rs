//! Optimistic read-write transactions
//!
//! Reads go to the store and record the version they observed (or that the
//! document was absent). Writes are buffered and also kept in an overlay so
//! later reads in the same transaction see them. [`Transaction::into_batch`]
//! turns the buffered writes into one batch guarded by every recorded
//! version; the store rejects it with `Aborted` if any of them moved.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::batch::{Write, WriteBatch};
use super::errors::StoreResult;
use super::{DocumentSnapshot, DocumentStore};

type DocKey = (String, String);

/// A transaction over a [`DocumentStore`]
pub struct Transaction<'a> {
    store: &'a dyn DocumentStore,
    reads: Vec<(DocKey, Option<u64>)>,
    read_index: HashMap<DocKey, Option<u64>>,
    overlay: HashMap<DocKey, Option<Map<String, Value>>>,
    batch: WriteBatch,
}

impl<'a> Transaction<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            reads: Vec::new(),
            read_index: HashMap::new(),
            overlay: HashMap::new(),
            batch: WriteBatch::new(),
        }
    }

    /// Read a document, seeing this transaction's own buffered writes
    pub fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>> {
        let key = (collection.to_string(), id.to_string());

        if let Some(staged) = self.overlay.get(&key) {
            let version = self.read_index.get(&key).copied().flatten().unwrap_or(0);
            return Ok(staged.clone().map(|data| DocumentSnapshot {
                id: id.to_string(),
                data,
                version,
            }));
        }

        let snapshot = self.store.get(collection, id)?;
        if !self.read_index.contains_key(&key) {
            let version = snapshot.as_ref().map(|s| s.version);
            self.read_index.insert(key.clone(), version);
            self.reads.push((key, version));
        }
        Ok(snapshot)
    }

    /// Buffer a set
    pub fn set(&mut self, collection: &str, id: &str, data: Map<String, Value>) -> StoreResult<()> {
        self.stage(Write::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        })
    }

    /// Buffer a merge-patch update; fails now if the document is missing
    pub fn update(
        &mut self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> StoreResult<()> {
        self.stage(Write::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        })
    }

    /// Buffer a delete
    pub fn delete(&mut self, collection: &str, id: &str) -> StoreResult<()> {
        self.stage(Write::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    /// Number of buffered writes
    pub fn write_count(&self) -> usize {
        self.batch.len()
    }

    /// Buffered writes guarded by the versions of everything read
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for ((collection, id), version) in self.reads {
            batch.require(collection, id, version);
        }
        for write in self.batch.writes() {
            batch.push(write.clone());
        }
        batch
    }

    fn stage(&mut self, write: Write) -> StoreResult<()> {
        let collection = write.collection().to_string();
        let id = write.id().to_string();

        let current = self.get(&collection, &id)?.map(|s| s.data);
        let next = write.apply(current)?;

        self.overlay.insert((collection, id), next);
        self.batch.push(write);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reads_see_own_writes() {
        let store = MemoryStore::new();
        store.set("users", "0x1", object(json!({"n": 1}))).unwrap();

        let mut txn = Transaction::new(&store);
        txn.update("users", "0x1", object(json!({"n": 2}))).unwrap();
        let seen = txn.get("users", "0x1").unwrap().unwrap();
        assert_eq!(seen.data["n"], json!(2));

        // Nothing visible until commit
        assert_eq!(store.get("users", "0x1").unwrap().unwrap().data["n"], json!(1));

        store.commit(txn.into_batch()).unwrap();
        assert_eq!(store.get("users", "0x1").unwrap().unwrap().data["n"], json!(2));
    }

    #[test]
    fn test_update_of_missing_fails_before_commit() {
        let store = MemoryStore::new();
        let mut txn = Transaction::new(&store);
        assert!(txn.update("users", "ghost", Map::new()).is_err());
        assert_eq!(txn.write_count(), 0);
    }

    #[test]
    fn test_concurrent_change_aborts_commit() {
        let store = MemoryStore::new();
        store.set("users", "0x1", object(json!({"builds": []}))).unwrap();

        let mut txn = Transaction::new(&store);
        txn.get("users", "0x1").unwrap();
        txn.update("users", "0x1", object(json!({"builds": ["b1"]})))
            .unwrap();

        // Another writer lands first
        store
            .update("users", "0x1", object(json!({"builds": ["b2"]})))
            .unwrap();

        let err = store.commit(txn.into_batch()).unwrap_err();
        assert!(err.is_contention());
        assert_eq!(
            store.get("users", "0x1").unwrap().unwrap().data["builds"],
            json!(["b2"])
        );
    }

    #[test]
    fn test_read_of_absent_document_guards_creation() {
        let store = MemoryStore::new();

        let mut txn = Transaction::new(&store);
        assert!(txn.get("config", "general").unwrap().is_none());
        txn.set("config", "general", object(json!({"a": 1}))).unwrap();

        store.set("config", "general", object(json!({"a": 0}))).unwrap();

        assert!(store.commit(txn.into_batch()).is_err());
    }
}
