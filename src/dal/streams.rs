//! Builder stream indexing operations

use serde_json::{json, Map};

use super::{DalError, DalResult, DataAccess};
use crate::model::{
    to_document, Stream, StreamUpdate, UpdatableStream, EVENT_COLLECTION, USER_COLLECTION,
};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{generate_id, FilterExpr, Query, WriteBatch};

const STREAM_FIELD: &str = "stream";

impl DataAccess {
    /// Streams of users whose `stream.streamAddress` is set and non-empty
    pub fn find_updatable_streams(&self, limit: Option<usize>) -> DalResult<Vec<UpdatableStream>> {
        let query = Query::collection(USER_COLLECTION)
            .filter(FilterExpr::neq("stream.streamAddress", json!("")))
            .maybe_limit(limit);

        self.store
            .query(&query)?
            .into_iter()
            .map(|snapshot| {
                let stream = match snapshot.data.get(STREAM_FIELD) {
                    Some(value) => serde_json::from_value::<Stream>(value.clone())?,
                    None => Stream::default(),
                };
                Ok(UpdatableStream {
                    builder_address: snapshot.id,
                    stream,
                })
            })
            .collect::<serde_json::Result<Vec<_>>>()
            .map_err(DalError::from)
    }

    /// Append the update's events and replace the owner's stream record,
    /// as one atomic batch
    pub fn update_stream_data(
        &self,
        stream: &UpdatableStream,
        update: &StreamUpdate,
    ) -> DalResult<()> {
        let mut batch = WriteBatch::new();
        for event in &update.events {
            batch.set(EVENT_COLLECTION, generate_id(), to_document(event)?);
        }

        let next = update.apply_to(&stream.stream);
        let mut patch = Map::new();
        patch.insert(STREAM_FIELD.to_string(), serde_json::to_value(&next)?);
        batch.update(USER_COLLECTION, stream.builder_address.as_str(), patch);

        self.store.commit(batch)?;

        log_event_with_fields(
            Event::StreamUpdated,
            &[
                ("builder", &stream.builder_address),
                ("stream_address", &next.stream_address),
                ("last_block", &update.last_block.to_string()),
                ("balance", &update.balance),
                ("events", &update.events.len().to_string()),
            ],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{from_snapshot, Event as EventRecord, User};
    use crate::store::{DocumentStore, MemoryStore};
    use std::sync::Arc;

    fn dal() -> DataAccess {
        let store = Arc::new(MemoryStore::new());
        let users = [
            ("0x1", json!({"stream": {"streamAddress": "0xs1", "cap": "0.5"}})),
            ("0x2", json!({"stream": {"streamAddress": ""}})),
            ("0x3", json!({"name": "no stream"})),
            ("0x4", json!({"stream": {"streamAddress": "0xs4"}})),
        ];
        for (id, doc) in users {
            store
                .set(USER_COLLECTION, id, doc.as_object().cloned().unwrap())
                .unwrap();
        }
        DataAccess::new(store)
    }

    #[test]
    fn test_only_streams_with_address() {
        let dal = dal();
        let streams = dal.find_updatable_streams(None).unwrap();

        let owners: Vec<&str> = streams.iter().map(|s| s.builder_address.as_str()).collect();
        assert_eq!(owners, vec!["0x1", "0x4"]);
        assert_eq!(streams[0].stream.cap.as_deref(), Some("0.5"));

        assert_eq!(dal.find_updatable_streams(Some(1)).unwrap().len(), 1);
        assert_eq!(dal.find_updatable_streams(Some(0)).unwrap().len(), 2);
    }

    #[test]
    fn test_update_writes_events_and_stream() {
        let dal = dal();
        let stream = dal.find_updatable_streams(Some(1)).unwrap().remove(0);
        let update = StreamUpdate {
            events: vec![
                EventRecord::new("stream.withdraw", 5, json!({"amount": "0.1"})),
                EventRecord::new("stream.withdraw", 6, json!({"amount": "0.2"})),
            ],
            cap: "1".into(),
            frequency: 2592000,
            last_contract: None,
            last_block: 900,
            balance: "0.7".into(),
        };

        dal.update_stream_data(&stream, &update).unwrap();

        assert_eq!(dal.find_all_events(None).unwrap().len(), 2);
        let user: User =
            from_snapshot(dal.store().get(USER_COLLECTION, "0x1").unwrap().unwrap()).unwrap();
        let saved = user.stream.unwrap();
        assert_eq!(saved.stream_address, "0xs1");
        assert_eq!(saved.last_indexed_block, Some(900));
        assert_eq!(saved.last_contract, Some(0));
        assert_eq!(saved.balance.as_deref(), Some("0.7"));
    }

    #[test]
    fn test_update_for_missing_user_writes_nothing() {
        let dal = dal();
        let stream = UpdatableStream {
            builder_address: "0xgone".into(),
            stream: Stream::default(),
        };
        let update = StreamUpdate {
            events: vec![EventRecord::new("stream.withdraw", 5, json!({}))],
            ..Default::default()
        };

        let err = dal.update_stream_data(&stream, &update).unwrap_err();
        assert_eq!(err.code(), "BUIDL_STORE_NOT_FOUND");
        assert!(dal.find_all_events(None).unwrap().is_empty());
    }
}
