//! buidl-db - document store and data access layer for a builder community site
//!
//! - `store`: document store contract, in-memory/file-backed store, transactions
//! - `model`: typed records for users, builds, events, cohorts and config
//! - `dal`: data access operations keeping build back-references consistent
//! - `api`: JSON request surface over the data access layer
//! - `cli`: `init`, `exec` and `start` commands
//! - `observability`: structured JSON log lines

pub mod api;
pub mod cli;
pub mod dal;
pub mod model;
pub mod observability;
pub mod store;
