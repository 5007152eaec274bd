//! # Data Access Layer
//!
//! [`DataAccess`] is the façade the rest of the site talks to. It owns no
//! state besides an injected [`DocumentStore`] handle and maps typed records
//! onto the `users`, `builds`, `events`, `cohorts` and `config` collections.
//!
//! Builds are denormalised: every user listed as a build's `builder` or in
//! its `coBuilders` carries a `{id, submittedTimestamp}` back-reference in
//! its own `builds` list. Build create/update/delete and the reference
//! helpers keep both sides in step inside one transaction each, so either
//! every document involved changes or none does.
//!
//! Reference policy:
//! - A referenced user that does not exist is skipped (logged at WARN)
//! - Appending a reference the user already holds is a no-op
//! - Removing a reference the user does not hold is a no-op

mod builds;
mod config_data;
mod errors;
mod events;
mod references;
mod streams;
mod users;

pub use errors::{DalError, DalResult};
pub use events::{condition_filters, CONDITION_PATH_SEPARATOR};

use std::sync::Arc;

use crate::observability::{log_event_with_fields, Event};
use crate::store::{DocumentStore, Transaction};

/// Default number of attempts for a transaction that keeps losing races
pub const DEFAULT_MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Tunables for [`DataAccess`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DalSettings {
    /// Attempts per transaction before a conflict is surfaced (minimum 1)
    pub max_transaction_attempts: u32,
}

impl Default for DalSettings {
    fn default() -> Self {
        Self {
            max_transaction_attempts: DEFAULT_MAX_TRANSACTION_ATTEMPTS,
        }
    }
}

/// Data access service over an injected document store
#[derive(Clone)]
pub struct DataAccess {
    store: Arc<dyn DocumentStore>,
    settings: DalSettings,
}

impl DataAccess {
    /// Create a service with default settings
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_settings(store, DalSettings::default())
    }

    /// Create a service with explicit settings
    pub fn with_settings(store: Arc<dyn DocumentStore>, settings: DalSettings) -> Self {
        let settings = DalSettings {
            max_transaction_attempts: settings.max_transaction_attempts.max(1),
        };
        Self { store, settings }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn settings(&self) -> &DalSettings {
        &self.settings
    }

    /// Run `body` in a transaction and commit it.
    ///
    /// A body that buffers no writes is not committed.
    ///
    /// When the commit loses a race with another writer the body is re-run
    /// on fresh reads, up to `max_transaction_attempts` times in total. Any
    /// other error, from the body or the store, is returned at once.
    pub(crate) fn run_transaction<T, F>(&self, name: &str, mut body: F) -> DalResult<T>
    where
        F: FnMut(&mut Transaction<'_>) -> DalResult<T>,
    {
        let mut attempt: u32 = 1;
        loop {
            let mut txn = Transaction::new(self.store.as_ref());
            let value = body(&mut txn)?;
            if txn.write_count() == 0 {
                return Ok(value);
            }

            match self.store.commit(txn.into_batch()) {
                Ok(()) => return Ok(value),
                Err(e) if e.is_contention() && attempt < self.settings.max_transaction_attempts => {
                    log_event_with_fields(
                        Event::TransactionRetry,
                        &[
                            ("transaction", name),
                            ("attempt", &attempt.to_string()),
                            ("reason", &e.to_string()),
                        ],
                    );
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_contention() {
                        log_event_with_fields(
                            Event::TransactionAborted,
                            &[
                                ("transaction", name),
                                ("attempts", &attempt.to_string()),
                                ("reason", &e.to_string()),
                            ],
                        );
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        DocumentSnapshot, MemoryStore, Query, StoreError, StoreResult, WriteBatch,
    };
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Store whose first `failures` commits report a conflict
    struct ContendedStore {
        inner: MemoryStore,
        failures: AtomicU32,
        commits: AtomicU32,
    }

    impl DocumentStore for ContendedStore {
        fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>> {
            self.inner.get(collection, id)
        }

        fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
            self.inner.query(query)
        }

        fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::Aborted("simulated".into()));
            }
            self.inner.commit(batch)
        }
    }

    fn contended(failures: u32) -> Arc<ContendedStore> {
        Arc::new(ContendedStore {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(failures),
            commits: AtomicU32::new(0),
        })
    }

    #[test]
    fn test_retries_until_commit_succeeds() {
        let store = contended(2);
        let dal = DataAccess::new(store.clone());

        let mut runs = 0;
        let out = dal
            .run_transaction("test", |txn| {
                runs += 1;
                txn.set("config", "general", serde_json::Map::new())?;
                Ok(runs)
            })
            .unwrap();

        assert_eq!(out, 3);
        assert_eq!(store.commits.load(Ordering::SeqCst), 3);
        assert!(store.inner.get("config", "general").unwrap().is_some());
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let store = contended(10);
        let dal = DataAccess::with_settings(
            store.clone(),
            DalSettings {
                max_transaction_attempts: 3,
            },
        );

        let err = dal
            .run_transaction("test", |txn| {
                txn.set("config", "general", serde_json::Map::new())?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.code(), "BUIDL_STORE_ABORTED");
        assert_eq!(store.commits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_body_error_is_not_retried() {
        let store = contended(0);
        let dal = DataAccess::new(store.clone());

        let mut runs = 0;
        let err = dal
            .run_transaction::<(), _>("test", |_| {
                runs += 1;
                Err(DalError::invalid_input("nope"))
            })
            .unwrap_err();

        assert_eq!(runs, 1);
        assert_eq!(err.code(), "BUIDL_INVALID_INPUT");
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        let dal = DataAccess::with_settings(
            Arc::new(MemoryStore::new()),
            DalSettings {
                max_transaction_attempts: 0,
            },
        );
        assert_eq!(dal.settings().max_transaction_attempts, 1);
    }
}
