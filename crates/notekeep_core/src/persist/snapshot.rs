//! JSON snapshot codec for the `notes` and `tags` keys.

use super::{KeyValueBackend, PersistError, PersistResult};
use crate::model::note::Note;
use log::{debug, error};
use std::collections::BTreeSet;

pub const NOTES_KEY: &str = "notes";
pub const TAGS_KEY: &str = "tags";

/// Materialized `(notes, tags)` state as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    pub tags: BTreeSet<String>,
}

/// Loads both keys. Absent keys yield empty collections.
///
/// # Errors
/// - `PersistError::Json` when a stored value is not the expected JSON shape.
/// - Backend errors are propagated unchanged.
pub fn load_snapshot(backend: &impl KeyValueBackend) -> PersistResult<Snapshot> {
    let notes: Vec<Note> = read_json(backend, NOTES_KEY)?.unwrap_or_default();
    // Stored as an array; duplicates collapse on load.
    let tags: Vec<String> = read_json(backend, TAGS_KEY)?.unwrap_or_default();
    debug!(
        "event=snapshot_load module=persist status=ok notes={} tags={}",
        notes.len(),
        tags.len()
    );
    Ok(Snapshot {
        notes,
        tags: tags.into_iter().collect(),
    })
}

/// Writes the full notes array under `NOTES_KEY`.
pub fn save_notes(backend: &mut impl KeyValueBackend, notes: &[Note]) -> PersistResult<()> {
    write_json(backend, NOTES_KEY, notes)
}

/// Writes the tag set as a JSON array under `TAGS_KEY`.
pub fn save_tags(backend: &mut impl KeyValueBackend, tags: &BTreeSet<String>) -> PersistResult<()> {
    write_json(backend, TAGS_KEY, tags)
}

fn read_json<T: serde::de::DeserializeOwned>(
    backend: &impl KeyValueBackend,
    key: &'static str,
) -> PersistResult<Option<T>> {
    let Some(raw) = backend.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| {
            error!(
                "event=snapshot_load module=persist status=error key={key} error_code=json_decode_failed error={source}"
            );
            PersistError::Json { key, source }
        })
}

fn write_json<T: serde::Serialize + ?Sized>(
    backend: &mut impl KeyValueBackend,
    key: &'static str,
    value: &T,
) -> PersistResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| PersistError::Json { key, source })?;
    backend.set(key, &raw).map_err(|err| {
        error!(
            "event=snapshot_save module=persist status=error key={key} error_code=backend_write_failed error={err}"
        );
        err
    })?;
    debug!("event=snapshot_save module=persist status=ok key={key} bytes={}", raw.len());
    Ok(())
}
