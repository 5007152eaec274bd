//! Observability for buidl-db
//!
//! Structured JSON log lines named by typed [`Event`]s.
//!
//! # Usage
//!
//! ```ignore
//! use buidl_db::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::BuildCreated, &[("build_id", "b1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
