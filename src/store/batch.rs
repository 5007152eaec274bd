//! Write batches
//!
//! A batch is committed all-or-nothing: every precondition must hold and
//! every write must apply, otherwise the store is left untouched.

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::path;

/// A single document write
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or overwrite a document
    Set {
        collection: String,
        id: String,
        data: Map<String, Value>,
    },

    /// Merge-patch an existing document
    Update {
        collection: String,
        id: String,
        patch: Map<String, Value>,
    },

    /// Remove a document (no-op when absent)
    Delete { collection: String, id: String },
}

impl Write {
    /// Collection the write targets
    pub fn collection(&self) -> &str {
        match self {
            Write::Set { collection, .. }
            | Write::Update { collection, .. }
            | Write::Delete { collection, .. } => collection,
        }
    }

    /// Document id the write targets
    pub fn id(&self) -> &str {
        match self {
            Write::Set { id, .. } | Write::Update { id, .. } | Write::Delete { id, .. } => id,
        }
    }

    /// Compute the document state after this write
    pub fn apply(
        &self,
        current: Option<Map<String, Value>>,
    ) -> StoreResult<Option<Map<String, Value>>> {
        match self {
            Write::Set { data, .. } => Ok(Some(data.clone())),
            Write::Update {
                collection,
                id,
                patch,
            } => {
                let mut doc = current.ok_or_else(|| StoreError::not_found(collection, id))?;
                path::apply_merge_patch(&mut doc, patch);
                Ok(Some(doc))
            }
            Write::Delete { .. } => Ok(None),
        }
    }
}

/// Expected version of a document at commit time.
///
/// `None` means the document must not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub collection: String,
    pub id: String,
    pub version: Option<u64>,
}

/// Ordered writes plus the preconditions guarding them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    preconditions: Vec<Precondition>,
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a set
    pub fn set(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        data: Map<String, Value>,
    ) -> &mut Self {
        self.push(Write::Set {
            collection: collection.into(),
            id: id.into(),
            data,
        })
    }

    /// Queue a merge-patch update
    pub fn update(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        patch: Map<String, Value>,
    ) -> &mut Self {
        self.push(Write::Update {
            collection: collection.into(),
            id: id.into(),
            patch,
        })
    }

    /// Queue a delete
    pub fn delete(&mut self, collection: impl Into<String>, id: impl Into<String>) -> &mut Self {
        self.push(Write::Delete {
            collection: collection.into(),
            id: id.into(),
        })
    }

    /// Queue an arbitrary write
    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    /// Require a document to be at `version` (or absent) when committed
    pub fn require(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        version: Option<u64>,
    ) -> &mut Self {
        self.preconditions.push(Precondition {
            collection: collection.into(),
            id: id.into(),
            version,
        });
        self
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}
