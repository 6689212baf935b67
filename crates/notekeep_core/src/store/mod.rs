//! Note/tag store: the single writer of notes and the global tag set.
//!
//! # Responsibility
//! - Own the authoritative notes collection, tag set and session filters.
//! - Route every mutation through operations that keep notes and tags
//!   consistent, then persist the changed values.
//!
//! # Invariants
//! - Every tag referenced by a note is a member of the global tag set.
//! - No note holds the same tag twice.
//! - Unchanged writes neither bump `last_update` nor persist.
//! - Tags outlive their last use; only `delete_tag` removes them.

use crate::model::note::{NoteId, NoteValidationError};
use crate::persist::PersistError;
use crate::query::filter::QueryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod clock;
mod note_store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use note_store::NoteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
#[derive(Debug)]
pub enum StoreError {
    /// Referenced note id is not in the collection. Signals a caller that is
    /// out of sync with the store.
    NotFound(NoteId),
    /// Note input failed validation.
    InvalidNote(NoteValidationError),
    /// Filter text is not a valid search pattern.
    InvalidPattern(QueryError),
    /// In-memory state is committed but the durable copy failed to update.
    Persist(PersistError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidNote(err) => write!(f, "invalid note: {err}"),
            Self::InvalidPattern(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "failed to persist store state: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::InvalidNote(err) => Some(err),
            Self::InvalidPattern(err) => Some(err),
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<NoteValidationError> for StoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidNote(value)
    }
}

impl From<QueryError> for StoreError {
    fn from(value: QueryError) -> Self {
        Self::InvalidPattern(value)
    }
}

impl From<PersistError> for StoreError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}
