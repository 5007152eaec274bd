//! Build operations

use std::slice;

use chrono::Utc;
use serde_json::{json, Map, Value};

use super::references::{add_references, remove_references};
use super::{DalError, DalResult, DataAccess};
use crate::model::{
    from_snapshot, to_document, Build, CoBuilderDiff, BUILD_COLLECTION, USER_COLLECTION,
};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{generate_id, FilterExpr, Query, Transaction};

const BUILDER_FIELD: &str = "builder";
const CO_BUILDERS_FIELD: &str = "coBuilders";

impl DataAccess {
    /// Store a new build under a generated id and reference it from its
    /// builder and every co-builder, all in one transaction.
    ///
    /// `submittedTimestamp` defaults to now. The builder must exist;
    /// co-builders that do not exist are skipped.
    pub fn create_build(&self, build: Build) -> DalResult<String> {
        if build.builder.is_empty() {
            return Err(DalError::invalid_input("build has no builder"));
        }

        let id = generate_id();
        let mut build = build;
        build.id = id.clone();
        if build.submitted_timestamp.is_none() {
            build.submitted_timestamp = Some(Utc::now().timestamp_millis());
        }
        let document = to_document(&build)?;

        self.run_transaction("create_build", |txn| {
            if txn.get(USER_COLLECTION, &build.builder)?.is_none() {
                return Err(DalError::not_found("user", build.builder.as_str()));
            }

            txn.set(BUILD_COLLECTION, &id, document.clone())?;
            add_references(
                txn,
                &id,
                slice::from_ref(&build.builder),
                build.submitted_timestamp,
            )?;
            add_references(txn, &id, &build.co_builders, build.submitted_timestamp)
        })?;

        log_event_with_fields(
            Event::BuildCreated,
            &[
                ("build_id", &id),
                ("builder", &build.builder),
                ("co_builders", &build.co_builders.len().to_string()),
            ],
        );
        Ok(id)
    }

    /// Merge `patch` into a build and return the updated record.
    ///
    /// When the patch carries `coBuilders`, references are added for
    /// co-builders that are new (with the build's stored submission time)
    /// and removed from co-builders that were dropped. A patch without
    /// `coBuilders` leaves co-builders and references untouched. A
    /// `builder` entry must name the current builder.
    pub fn update_build(&self, id: &str, patch: Map<String, Value>) -> DalResult<Build> {
        let mut patch = patch;
        patch.remove("id");

        let incoming: Option<Vec<String>> = match patch.get(CO_BUILDERS_FIELD) {
            None => None,
            Some(Value::Null) => Some(Vec::new()),
            Some(value) => Some(serde_json::from_value(value.clone()).map_err(|e| {
                DalError::invalid_input(format!("coBuilders must be a list of ids: {}", e))
            })?),
        };

        let updated = self.run_transaction("update_build", |txn| {
            let existing = load_build(txn, id)?;

            // A full record may echo the builder back; only a change is refused
            if let Some(builder) = patch.get(BUILDER_FIELD) {
                if builder.as_str() != Some(existing.builder.as_str()) {
                    return Err(DalError::invalid_input(
                        "the builder of a build cannot change",
                    ));
                }
            }

            if let Some(incoming) = &incoming {
                let diff = CoBuilderDiff::between(&existing.co_builders, incoming);
                if !diff.is_empty() {
                    add_references(txn, id, &diff.added, existing.submitted_timestamp)?;

                    // The owner keeps its reference even when it stops being a co-builder
                    let removed: Vec<String> = diff
                        .removed
                        .into_iter()
                        .filter(|user| *user != existing.builder)
                        .collect();
                    remove_references(txn, id, &removed)?;
                }
            }

            txn.update(BUILD_COLLECTION, id, patch.clone())?;
            load_build(txn, id)
        })?;

        log_event_with_fields(Event::BuildUpdated, &[("build_id", id)]);
        Ok(updated)
    }

    /// Delete a build and strip its references from the builder and every
    /// co-builder in one transaction. Users that no longer exist are skipped.
    pub fn delete_build(&self, id: &str) -> DalResult<()> {
        let build = self.run_transaction("delete_build", |txn| {
            let build = load_build(txn, id)?;
            remove_references(txn, id, slice::from_ref(&build.builder))?;
            remove_references(txn, id, &build.co_builders)?;
            txn.delete(BUILD_COLLECTION, id)?;
            Ok(build)
        })?;

        log_event_with_fields(
            Event::BuildDeleted,
            &[("build_id", id), ("builder", &build.builder)],
        );
        Ok(())
    }

    pub fn find_build_by_id(&self, id: &str) -> DalResult<Option<Build>> {
        match self.store.get(BUILD_COLLECTION, id)? {
            Some(snapshot) => Ok(Some(from_snapshot(snapshot)?)),
            None => Ok(None),
        }
    }

    /// All builds, optionally only those whose `featured` flag matches
    pub fn find_all_builds(&self, featured: Option<bool>) -> DalResult<Vec<Build>> {
        let mut query = Query::collection(BUILD_COLLECTION);
        if let Some(featured) = featured {
            query = query.filter(FilterExpr::eq("featured", Value::Bool(featured)));
        }
        self.query_builds(&query)
    }

    /// Builds owned by `address` followed by builds it co-builds.
    ///
    /// A build listing its owner as a co-builder appears twice.
    pub fn find_builder_builds(&self, address: &str) -> DalResult<Vec<Build>> {
        let owned = Query::collection(BUILD_COLLECTION)
            .filter(FilterExpr::eq(BUILDER_FIELD, json!(address)));
        let co_built = Query::collection(BUILD_COLLECTION)
            .filter(FilterExpr::array_contains(CO_BUILDERS_FIELD, json!(address)));

        let mut builds = self.query_builds(&owned)?;
        builds.extend(self.query_builds(&co_built)?);
        Ok(builds)
    }

    /// Set or clear a build's `featured` flag
    pub fn feature_build(&self, id: &str, featured: bool) -> DalResult<()> {
        let mut patch = Map::new();
        patch.insert("featured".to_string(), Value::Bool(featured));
        self.store.update(BUILD_COLLECTION, id, patch)?;

        log_event_with_fields(
            Event::BuildFeatured,
            &[("build_id", id), ("featured", &featured.to_string())],
        );
        Ok(())
    }

    fn query_builds(&self, query: &Query) -> DalResult<Vec<Build>> {
        self.store
            .query(query)?
            .into_iter()
            .map(|snapshot| from_snapshot(snapshot).map_err(DalError::from))
            .collect()
    }
}

fn load_build(txn: &mut Transaction<'_>, id: &str) -> DalResult<Build> {
    match txn.get(BUILD_COLLECTION, id)? {
        Some(snapshot) => Ok(from_snapshot(snapshot)?),
        None => Err(DalError::not_found("build", id)),
    }
}
