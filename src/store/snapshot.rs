//! On-disk snapshot of a store
//!
//! The whole store is written as one JSON document:
//!
//! ```json
//! { "format_version": 1, "saved_at": "<RFC3339>", "collections": { "users": { "<id>": {..} } } }
//! ```
//!
//! Writes go to `<path>.tmp`, are fsynced, then renamed over `<path>`, so a
//! crash mid-write leaves the previous snapshot intact.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};

/// Collection name -> document id -> document body
pub type CollectionsDump = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    format_version: u8,
    saved_at: String,
    collections: CollectionsDump,
}

/// Snapshot file location
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the snapshot; a missing file is an empty store
    pub fn load(&self) -> StoreResult<CollectionsDump> {
        if !self.path.exists() {
            return Ok(CollectionsDump::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            StoreError::Io(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let doc: SnapshotDocument = serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("Invalid snapshot {}: {}", self.path.display(), e))
        })?;

        if doc.format_version != FORMAT_VERSION {
            return Err(StoreError::Serialization(format!(
                "Unsupported snapshot format_version {} in {}",
                doc.format_version,
                self.path.display()
            )));
        }

        Ok(doc.collections)
    }

    /// Durably replace the snapshot with `collections`
    pub fn write(&self, collections: &CollectionsDump) -> StoreResult<()> {
        let doc = SnapshotDocument {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            collections: collections.clone(),
        };
        let json = serde_json::to_vec_pretty(&doc)?;

        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let tmp_path = self.tmp_path();
        let mut file = File::create(&tmp_path).map_err(|e| {
            StoreError::Io(format!("Failed to create {}: {}", tmp_path.display(), e))
        })?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            StoreError::Io(format!(
                "Failed to move {} to {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        if let Some(parent) = self.parent_dir() {
            let dir = OpenOptions::new().read(true).open(parent)?;
            dir.sync_all()?;
        }

        Ok(())
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
