//! In-memory document store
//!
//! Collections are kept as id-ordered maps behind one `RwLock`. Every
//! committed write stamps the document with a fresh version from a store-wide
//! counter; transactions use these versions as preconditions.
//!
//! When opened on a snapshot file, each commit is applied to a copy of the
//! state, the copy is written to disk, and only then published. A failed
//! disk write therefore leaves both memory and file at the previous state.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};

use super::batch::WriteBatch;
use super::errors::{StoreError, StoreResult};
use super::query::Query;
use super::snapshot::{CollectionsDump, SnapshotFile};
use super::{DocumentSnapshot, DocumentStore};

#[derive(Debug, Clone)]
struct StoredDocument {
    data: Map<String, Value>,
    version: u64,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    collections: HashMap<String, BTreeMap<String, StoredDocument>>,
    last_version: u64,
}

impl StoreState {
    fn from_dump(dump: CollectionsDump) -> Self {
        let mut state = StoreState::default();
        for (collection, docs) in dump {
            let mut stored = BTreeMap::new();
            for (id, data) in docs {
                state.last_version += 1;
                stored.insert(
                    id,
                    StoredDocument {
                        data,
                        version: state.last_version,
                    },
                );
            }
            state.collections.insert(collection, stored);
        }
        state
    }

    fn to_dump(&self) -> CollectionsDump {
        self.collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, docs)| {
                let docs = docs
                    .iter()
                    .map(|(id, doc)| (id.clone(), doc.data.clone()))
                    .collect();
                (name.clone(), docs)
            })
            .collect()
    }

    fn document(&self, collection: &str, id: &str) -> Option<&StoredDocument> {
        self.collections.get(collection).and_then(|c| c.get(id))
    }

    /// Check preconditions, stage every write, then publish the staged
    /// documents. Nothing is mutated unless the whole batch applies.
    fn apply(&mut self, batch: &WriteBatch) -> StoreResult<()> {
        for precondition in batch.preconditions() {
            let current = self
                .document(&precondition.collection, &precondition.id)
                .map(|d| d.version);
            if current != precondition.version {
                return Err(StoreError::Aborted(format!(
                    "{}/{} changed since it was read (expected {:?}, found {:?})",
                    precondition.collection, precondition.id, precondition.version, current
                )));
            }
        }

        let mut order: Vec<(String, String)> = Vec::new();
        let mut staged: HashMap<(String, String), Option<Map<String, Value>>> = HashMap::new();

        for write in batch.writes() {
            let key = (write.collection().to_string(), write.id().to_string());
            let current = match staged.get(&key) {
                Some(doc) => doc.clone(),
                None => {
                    order.push(key.clone());
                    self.document(&key.0, &key.1).map(|d| d.data.clone())
                }
            };
            let next = write.apply(current)?;
            staged.insert(key, next);
        }

        for key in order {
            let next = staged.remove(&key).flatten();
            let (collection, id) = key;
            match next {
                Some(data) => {
                    self.last_version += 1;
                    self.collections.entry(collection).or_default().insert(
                        id,
                        StoredDocument {
                            data,
                            version: self.last_version,
                        },
                    );
                }
                None => {
                    if let Some(docs) = self.collections.get_mut(&collection) {
                        docs.remove(&id);
                    }
                }
            }
        }

        Ok(())
    }
}

/// Document store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    snapshot: Option<SnapshotFile>,
}

impl MemoryStore {
    /// Create an empty, non-persistent store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a non-persistent store holding `collections`
    pub fn with_documents(collections: CollectionsDump) -> Self {
        Self {
            state: RwLock::new(StoreState::from_dump(collections)),
            snapshot: None,
        }
    }

    /// Open a store persisted to `path`, loading it if it exists
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let snapshot = SnapshotFile::new(path.as_ref());
        let collections = snapshot.load()?;
        Ok(Self {
            state: RwLock::new(StoreState::from_dump(collections)),
            snapshot: Some(snapshot),
        })
    }

    /// Whether commits are written to disk
    pub fn is_persistent(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Copy of every document, by collection
    pub fn dump(&self) -> StoreResult<CollectionsDump> {
        Ok(self.read_state()?.to_dump())
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self
            .read_state()?
            .collections
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0))
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|e| StoreError::Internal(format!("store lock poisoned: {}", e)))
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|e| StoreError::Internal(format!("store lock poisoned: {}", e)))
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>> {
        let state = self.read_state()?;
        Ok(state.document(collection, id).map(|doc| DocumentSnapshot {
            id: id.to_string(),
            data: doc.data.clone(),
            version: doc.version,
        }))
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        query.validate()?;

        let candidates: Vec<DocumentSnapshot> = {
            let state = self.read_state()?;
            state
                .collections
                .get(&query.collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, doc)| DocumentSnapshot {
                            id: id.clone(),
                            data: doc.data.clone(),
                            version: doc.version,
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        Ok(query.evaluate(candidates))
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut state = self.write_state()?;

        match &self.snapshot {
            None => state.apply(&batch),
            Some(file) => {
                let mut next = state.clone();
                next.apply(&batch)?;
                file.write(&next.to_dump())?;
                *state = next;
                Ok(())
            }
        }
    }
}
