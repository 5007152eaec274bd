//! Field paths and merge patches
//!
//! A field path addresses a value inside nested maps, segments joined by
//! [`FIELD_PATH_SEPARATOR`] (`stream.streamAddress`). Merge patches treat
//! every top-level key of the patch as a field path: the addressed field is
//! replaced, everything else is left untouched.

use serde_json::{Map, Value};

/// Separator between field path segments
pub const FIELD_PATH_SEPARATOR: char = '.';

/// Resolve a field path inside a document
pub fn resolve<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(FIELD_PATH_SEPARATOR);
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Apply a merge patch to a document in place
pub fn apply_merge_patch(doc: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (path, value) in patch {
        set_path(doc, path, value.clone());
    }
}

/// Set the value at a field path, creating intermediate maps as needed.
///
/// A non-map value sitting on an intermediate segment is replaced by a map.
pub fn set_path(doc: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once(FIELD_PATH_SEPARATOR) {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}
