//! Core storage for TinyTodo.
//! Expiring cache, typed record stores and the category/day journal.

pub mod cache;
pub mod clock;
pub mod config;
pub mod journal;
pub mod logging;
pub mod model;
pub mod store;

pub use cache::{
    CacheError, CacheResult, CacheSnapshot, Entry, ExpiringCache, MergeError, MergeFields,
    UpdateOptions,
};
pub use clock::{system_clock, Clock, ManualClock, SystemClock};
pub use config::JournalConfig;
pub use journal::{
    Category, ChangeObserver, ChangeSignal, ChangeToken, DateDirection, PartitionedJournal,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{Record, RecordId, RecordValidationError};
pub use store::record_store::{LoadOutcome, RecordStore, StoreDiagnostics, StoreRecord};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
