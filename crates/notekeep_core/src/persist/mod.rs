//! Persistence glue between the store and a durable key-value backend.
//!
//! # Responsibility
//! - Define the `KeyValueBackend` contract the store writes snapshots through.
//! - Encode/decode the `notes` and `tags` values as JSON.
//!
//! # Invariants
//! - `notes` and `tags` are persisted independently under well-known keys.
//! - A missing key loads as an empty collection, never as an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod backend;
mod snapshot;
mod sqlite;

pub use backend::{KeyValueBackend, MemoryBackend};
pub use snapshot::{load_snapshot, save_notes, save_tags, Snapshot, NOTES_KEY, TAGS_KEY};
pub use sqlite::SqliteBackend;

pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence-layer failure.
#[derive(Debug)]
pub enum PersistError {
    /// Stored value under `key` could not be encoded or decoded.
    Json {
        key: &'static str,
        source: serde_json::Error,
    },
    /// SQLite backend failure.
    Db(DbError),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json { key, source } => write!(f, "invalid `{key}` snapshot: {source}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
