//! Core state engine for notekeep, a personal note manager.
//! Owns notes, the global tag set and the rules binding them.

pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod query;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{dedup_tags, Note, NoteDraft, NoteId, NotePatch, NoteValidationError};
pub use persist::{
    KeyValueBackend, MemoryBackend, PersistError, PersistResult, Snapshot, SqliteBackend,
};
pub use query::filter::{apply_filter, FilterSpec, QueryError, QueryResult, SortOrder};
pub use store::{Clock, FixedClock, NoteStore, StoreError, StoreResult, SystemClock};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
