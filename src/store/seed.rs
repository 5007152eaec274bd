//! Seed data import
//!
//! A seed is a JSON document shaped `{ "<collection>": { "<id>": {..} } }`.
//! Emulator mode starts from the bundled sample seed unless a seed file is
//! configured.

use std::fs;
use std::path::Path;

use super::errors::{StoreError, StoreResult};
use super::snapshot::CollectionsDump;
use super::{DocumentStore, WriteBatch};
use crate::observability::{log_event_with_fields, Event};

const SAMPLE_SEED: &str = include_str!("../../seed/local.json");

/// Parse a seed document
pub fn parse(json: &str) -> StoreResult<CollectionsDump> {
    serde_json::from_str(json).map_err(|e| StoreError::Serialization(format!("Invalid seed: {}", e)))
}

/// Read a seed file
pub fn load(path: &Path) -> StoreResult<CollectionsDump> {
    let content = fs::read_to_string(path)
        .map_err(|e| StoreError::Io(format!("Failed to read seed {}: {}", path.display(), e)))?;
    parse(&content)
}

/// The bundled sample seed
pub fn sample() -> StoreResult<CollectionsDump> {
    parse(SAMPLE_SEED)
}

/// Write every seed document in one batch, overwriting same-id documents.
///
/// Returns the number of documents written.
pub fn import(store: &dyn DocumentStore, seed: &CollectionsDump) -> StoreResult<usize> {
    let mut batch = WriteBatch::new();
    for (collection, docs) in seed {
        for (id, data) in docs {
            batch.set(collection.as_str(), id.as_str(), data.clone());
        }
    }

    let count = batch.len();
    store.commit(batch)?;

    log_event_with_fields(
        Event::SeedImported,
        &[
            ("collections", &seed.len().to_string()),
            ("documents", &count.to_string()),
        ],
    );

    Ok(count)
}
