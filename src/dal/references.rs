//! Build back-references held in each user's `builds` list

use serde_json::{Map, Value};

use super::{DalResult, DataAccess};
use crate::model::{from_snapshot, BuildRef, User, USER_COLLECTION};
use crate::observability::{log_event_with_fields, Event};
use crate::store::Transaction;

impl DataAccess {
    /// Append a `{build_id, submitted_timestamp}` reference to each listed
    /// user in one transaction.
    ///
    /// Users that do not exist are skipped; users already holding the
    /// reference are left unchanged.
    pub fn add_co_builder_references(
        &self,
        build_id: &str,
        co_builders: &[String],
        submitted_timestamp: Option<i64>,
    ) -> DalResult<()> {
        self.run_transaction("add_co_builder_references", |txn| {
            add_references(txn, build_id, co_builders, submitted_timestamp)
        })
    }

    /// Remove every reference to `build_id` from each listed user in one
    /// transaction. Missing users are skipped.
    pub fn delete_co_builder_references(
        &self,
        build_id: &str,
        co_builders: &[String],
    ) -> DalResult<()> {
        self.run_transaction("delete_co_builder_references", |txn| {
            remove_references(txn, build_id, co_builders)
        })
    }
}

/// Stage reference appends inside `txn`
pub(crate) fn add_references(
    txn: &mut Transaction<'_>,
    build_id: &str,
    user_ids: &[String],
    submitted_timestamp: Option<i64>,
) -> DalResult<()> {
    for user_id in user_ids {
        let mut user = match load_user(txn, build_id, user_id)? {
            Some(user) => user,
            None => continue,
        };

        if user.references(build_id) {
            log_event_with_fields(
                Event::ReferenceAlreadyPresent,
                &[("build_id", build_id), ("user_id", user_id)],
            );
            continue;
        }

        user.builds.push(BuildRef::new(build_id, submitted_timestamp));
        txn.update(USER_COLLECTION, user_id, builds_patch(&user.builds)?)?;
    }
    Ok(())
}

/// Stage reference removals inside `txn`
pub(crate) fn remove_references(
    txn: &mut Transaction<'_>,
    build_id: &str,
    user_ids: &[String],
) -> DalResult<()> {
    for user_id in user_ids {
        let mut user = match load_user(txn, build_id, user_id)? {
            Some(user) => user,
            None => continue,
        };

        if !user.references(build_id) {
            continue;
        }

        user.builds.retain(|r| r.id != build_id);
        txn.update(USER_COLLECTION, user_id, builds_patch(&user.builds)?)?;
    }
    Ok(())
}

fn load_user(txn: &mut Transaction<'_>, build_id: &str, user_id: &str) -> DalResult<Option<User>> {
    match txn.get(USER_COLLECTION, user_id)? {
        Some(snapshot) => Ok(Some(from_snapshot(snapshot)?)),
        None => {
            log_event_with_fields(
                Event::ReferenceSkipped,
                &[
                    ("build_id", build_id),
                    ("user_id", user_id),
                    ("reason", "user does not exist"),
                ],
            );
            Ok(None)
        }
    }
}

fn builds_patch(builds: &[BuildRef]) -> DalResult<Map<String, Value>> {
    let mut patch = Map::new();
    patch.insert("builds".to_string(), serde_json::to_value(builds)?);
    Ok(patch)
}
