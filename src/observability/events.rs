//! Observable events
//!
//! Every log line the crate emits is named by one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Command startup begins
    StartupBegin,
    /// Store opened and ready
    StartupComplete,
    /// Reading requests from stdin
    Serving,
    /// Input exhausted, exiting
    ShutdownComplete,

    // Configuration and store
    /// Configuration loaded
    ConfigLoaded,
    /// Document store opened
    StoreOpened,
    /// Seed documents written
    SeedImported,

    // Requests
    /// Request parsed
    RequestReceived,
    /// Request answered with data
    RequestCompleted,
    /// Request answered with an error
    RequestRejected,

    // Builds
    /// Build and its references committed
    BuildCreated,
    /// Build patch and reference changes committed
    BuildUpdated,
    /// Build and its references removed
    BuildDeleted,
    /// Featured flag changed
    BuildFeatured,

    // Back-references
    /// Referenced user does not exist, nothing written for it
    ReferenceSkipped,
    /// User already references the build, nothing appended
    ReferenceAlreadyPresent,

    // Transactions
    /// Commit lost a race, transaction body re-run
    TransactionRetry,
    /// Transaction gave up after the last attempt
    TransactionAborted,

    // Streams
    /// Stream events appended and stream record replaced
    StreamUpdated,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StartupBegin => "BUIDL_DB_STARTUP_BEGIN",
            Event::StartupComplete => "BUIDL_DB_STARTUP_COMPLETE",
            Event::Serving => "BUIDL_DB_SERVING",
            Event::ShutdownComplete => "BUIDL_DB_SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::SeedImported => "SEED_IMPORTED",

            Event::RequestReceived => "REQUEST_BEGIN",
            Event::RequestCompleted => "REQUEST_COMPLETE",
            Event::RequestRejected => "REQUEST_REJECTED",

            Event::BuildCreated => "BUILD_CREATED",
            Event::BuildUpdated => "BUILD_UPDATED",
            Event::BuildDeleted => "BUILD_DELETED",
            Event::BuildFeatured => "BUILD_FEATURED",

            Event::ReferenceSkipped => "REFERENCE_SKIPPED",
            Event::ReferenceAlreadyPresent => "REFERENCE_ALREADY_PRESENT",

            Event::TransactionRetry => "TRANSACTION_RETRY",
            Event::TransactionAborted => "TRANSACTION_ABORTED",

            Event::StreamUpdated => "STREAM_UPDATED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RequestReceived | Event::RequestCompleted | Event::ReferenceAlreadyPresent => {
                Severity::Trace
            }
            Event::ReferenceSkipped | Event::TransactionRetry | Event::RequestRejected => {
                Severity::Warn
            }
            Event::TransactionAborted => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
