//! Event log operations

use std::collections::BTreeMap;

use serde_json::Value;

use super::{DalError, DalResult, DataAccess};
use crate::model::{from_snapshot, to_document, Event, EVENT_COLLECTION};
use crate::store::{FilterExpr, Query, SortDirection, FIELD_PATH_SEPARATOR};

/// Separator callers use for nested fields in condition keys
pub const CONDITION_PATH_SEPARATOR: char = '/';

/// Separator for alternatives in a condition value
const CONDITION_VALUE_SEPARATOR: char = ',';

impl DataAccess {
    /// Append an event under a generated id and return the id
    pub fn create_event(&self, event: &Event) -> DalResult<String> {
        Ok(self.store.add(EVENT_COLLECTION, to_document(event)?)?)
    }

    /// Events newest first, optionally capped. A limit of zero returns
    /// every event.
    pub fn find_all_events(&self, limit: Option<usize>) -> DalResult<Vec<Event>> {
        self.find_events(Vec::new(), limit)
    }

    /// Events matching every condition, newest first.
    ///
    /// Keys are field paths using `/` for nesting (`payload/userAddress`).
    /// Every `/` in a key is translated, not only the first, so
    /// `payload/user/address` names a field two levels down.
    /// A value holding commas matches any of its comma-separated parts;
    /// any other value must match exactly.
    pub fn find_events_where(
        &self,
        conditions: &BTreeMap<String, String>,
        limit: Option<usize>,
    ) -> DalResult<Vec<Event>> {
        self.find_events(condition_filters(conditions), limit)
    }

    fn find_events(&self, filters: Vec<FilterExpr>, limit: Option<usize>) -> DalResult<Vec<Event>> {
        let query = filters
            .into_iter()
            .fold(Query::collection(EVENT_COLLECTION), Query::filter)
            .order_by("timestamp", SortDirection::Desc)
            .maybe_limit(limit);

        self.store
            .query(&query)?
            .into_iter()
            .map(|snapshot| from_snapshot(snapshot).map_err(DalError::from))
            .collect()
    }
}

/// Translate string conditions into store filters
pub fn condition_filters(conditions: &BTreeMap<String, String>) -> Vec<FilterExpr> {
    conditions
        .iter()
        .map(|(key, value)| {
            let field: String = key
                .chars()
                .map(|c| match c {
                    CONDITION_PATH_SEPARATOR => FIELD_PATH_SEPARATOR,
                    other => other,
                })
                .collect();
            let parts: Vec<&str> = value.split(CONDITION_VALUE_SEPARATOR).collect();

            if parts.len() > 1 {
                let values = parts.into_iter().map(|p| Value::String(p.to_string())).collect();
                FilterExpr::in_list(field, values)
            } else {
                FilterExpr::eq(field, Value::String(value.clone()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FilterOperator, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn conditions(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn seeded() -> DataAccess {
        let dal = DataAccess::new(Arc::new(MemoryStore::new()));
        let events = [
            ("build.submit", 10, json!({"userAddress": "0x1"})),
            ("build.submit", 30, json!({"userAddress": "0x2"})),
            ("stream.withdraw", 20, json!({"userAddress": "0x1"})),
            ("user.create", 40, json!({"userAddress": "0x3"})),
        ];
        for (kind, ts, payload) in events {
            dal.create_event(&Event::new(kind, ts, payload)).unwrap();
        }
        dal
    }

    fn timestamps(events: &[Event]) -> Vec<i64> {
        events.iter().map(|e| e.timestamp).collect()
    }

    #[test]
    fn test_filters_from_conditions() {
        let filters = condition_filters(&conditions(&[
            ("payload/user/address", "0x1"),
            ("type", "a,b"),
        ]));

        assert_eq!(filters[0].field, "payload.user.address");
        assert_eq!(filters[0].operator, FilterOperator::Eq);
        assert_eq!(filters[1].operator, FilterOperator::In);
        assert_eq!(filters[1].value, json!(["a", "b"]));
    }

    #[test]
    fn test_all_events_newest_first() {
        let dal = seeded();
        assert_eq!(timestamps(&dal.find_all_events(None).unwrap()), vec![40, 30, 20, 10]);
        assert_eq!(timestamps(&dal.find_all_events(Some(2)).unwrap()), vec![40, 30]);
    }

    #[test]
    fn test_zero_limit_returns_everything() {
        let dal = seeded();
        assert_eq!(dal.find_all_events(Some(0)).unwrap().len(), 4);

        let events = dal
            .find_events_where(&conditions(&[("type", "build.submit")]), Some(0))
            .unwrap();
        assert_eq!(timestamps(&events), vec![30, 10]);
    }

    #[test]
    fn test_where_with_alternatives_and_nested_key() {
        let dal = seeded();

        let events = dal
            .find_events_where(&conditions(&[("type", "build.submit,stream.withdraw")]), None)
            .unwrap();
        assert_eq!(timestamps(&events), vec![30, 20, 10]);

        let events = dal
            .find_events_where(&conditions(&[("payload/userAddress", "0x1")]), Some(1))
            .unwrap();
        assert_eq!(timestamps(&events), vec![20]);
    }

    #[test]
    fn test_created_event_has_id() {
        let dal = DataAccess::new(Arc::new(MemoryStore::new()));
        let id = dal
            .create_event(&Event::new("user.create", 1, json!({})))
            .unwrap();

        let events = dal.find_all_events(None).unwrap();
        assert_eq!(events[0].id, id);
    }
}
