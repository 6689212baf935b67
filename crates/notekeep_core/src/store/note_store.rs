//! In-memory note/tag store with write-through persistence.
//!
//! # Invariants
//! - Each operation fully commits in memory before it persists.
//! - A value that failed to persist stays dirty and is retried by the next
//!   operation or by `flush`.
//! - Tag cascades build the new note list first and swap it in whole.
//! - Cascades from `rename_tag`/`delete_tag` do not bump `last_update`.
//! - Rename merges keep the earliest position of the merged tag.

use super::{Clock, StoreError, StoreResult, SystemClock};
use crate::model::note::{dedup_tags, Note, NoteDraft, NoteId, NotePatch};
use crate::persist::{load_snapshot, save_notes, save_tags, KeyValueBackend};
use crate::query::filter::{apply_filter, compile_pattern, FilterSpec, SortOrder};
use log::{debug, warn};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Authoritative owner of notes, tags and the session filter.
pub struct NoteStore<B: KeyValueBackend, C: Clock = SystemClock> {
    notes: Vec<Note>,
    tags: BTreeSet<String>,
    filters: FilterSpec,
    backend: B,
    clock: C,
    notes_dirty: bool,
    tags_dirty: bool,
}

impl<B: KeyValueBackend> NoteStore<B, SystemClock> {
    /// Loads the store from `backend` using the wall clock.
    pub fn open_with_system_clock(backend: B) -> StoreResult<Self> {
        Self::open(backend, SystemClock)
    }
}

impl<B: KeyValueBackend, C: Clock> NoteStore<B, C> {
    /// Loads persisted state and repairs integrity violations found in it.
    ///
    /// Missing keys load as empty collections. Repairs:
    /// - repeated tags inside a note are collapsed (earliest position kept);
    /// - tags referenced by notes but absent from the tag set are registered;
    /// - notes with a nil id, or sharing an id with an earlier note, get a
    ///   fresh id.
    ///
    /// Repaired values are written back; clean loads write nothing.
    pub fn open(backend: B, clock: C) -> StoreResult<Self> {
        let snapshot = load_snapshot(&backend)?;
        let mut store = Self {
            notes: snapshot.notes,
            tags: snapshot.tags,
            filters: FilterSpec::default(),
            backend,
            clock,
            notes_dirty: false,
            tags_dirty: false,
        };

        let (notes_repaired, tags_repaired) = store.repair_integrity();
        store.notes_dirty = notes_repaired;
        store.tags_dirty = tags_repaired;
        store.flush()?;

        debug!(
            "event=store_open module=store status=ok notes={} tags={} repaired={}",
            store.notes.len(),
            store.tags.len(),
            notes_repaired || tags_repaired
        );
        Ok(store)
    }

    /// All notes in collection order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Global tag set.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn get_note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether some in-memory change has not reached the backend yet.
    pub fn has_unsaved_changes(&self) -> bool {
        self.notes_dirty || self.tags_dirty
    }

    /// Writes every dirty value to the backend.
    ///
    /// Both values are attempted even when the first write fails; the first
    /// error is returned and failed values stay dirty.
    pub fn flush(&mut self) -> StoreResult<()> {
        let tags_result = if self.tags_dirty {
            save_tags(&mut self.backend, &self.tags)
        } else {
            Ok(())
        };
        if tags_result.is_ok() {
            self.tags_dirty = false;
        }

        let notes_result = if self.notes_dirty {
            save_notes(&mut self.backend, &self.notes)
        } else {
            Ok(())
        };
        if notes_result.is_ok() {
            self.notes_dirty = false;
        }

        tags_result?;
        notes_result?;
        Ok(())
    }

    /// Consumes the store and hands back its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Notes to present under the current filter.
    pub fn visible_notes(&self) -> StoreResult<Vec<Note>> {
        Ok(apply_filter(&self.notes, &self.filters)?)
    }

    /// Creates a note from `draft` and returns it.
    ///
    /// Draft tags are de-duplicated; tags unknown to the global set are
    /// registered so the new note never references an unregistered tag.
    ///
    /// # Errors
    /// - `StoreError::InvalidNote` when the draft text is blank.
    pub fn add_note(&mut self, draft: NoteDraft) -> StoreResult<Note> {
        draft.validate()?;

        let note = Note::new(draft.text, draft.tags, self.clock.now_ms());
        let registered = self.register_tags(&note.tags);
        self.notes.push(note.clone());

        self.tags_dirty |= registered;
        self.notes_dirty = true;
        self.flush()?;

        debug!(
            "event=note_add module=store status=ok note_id={} tags={}",
            note.id,
            note.tags.len()
        );
        Ok(note)
    }

    /// Deletes one note. Tags it used stay in the global set.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown.
    pub fn remove_note(&mut self, id: NoteId) -> StoreResult<()> {
        let index = self.position(id)?;
        self.notes.remove(index);
        self.notes_dirty = true;
        self.flush()?;

        debug!("event=note_remove module=store status=ok note_id={id}");
        Ok(())
    }

    /// Replaces a note's text. Returns whether anything changed.
    pub fn set_note_text(&mut self, id: NoteId, text: impl Into<String>) -> StoreResult<bool> {
        self.change_note(id, NotePatch::text(text))
    }

    /// Replaces a note's tag list. Returns whether anything changed.
    ///
    /// The input is de-duplicated before comparison; unknown tags are
    /// registered globally.
    pub fn set_note_tags(&mut self, id: NoteId, tags: Vec<String>) -> StoreResult<bool> {
        self.change_note(id, NotePatch::tags(tags))
    }

    /// Applies every field in `patch` with a single `last_update` bump.
    ///
    /// When all patched fields already equal the current values, the note is
    /// left untouched and `Ok(false)` is returned; only values still dirty
    /// from an earlier failed write are flushed.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown.
    pub fn change_note(&mut self, id: NoteId, patch: NotePatch) -> StoreResult<bool> {
        let index = self.position(id)?;
        if patch.is_empty() {
            self.flush()?;
            return Ok(false);
        }

        let (text, tags) = {
            let current = &self.notes[index];
            let text = patch.text.filter(|text| *text != current.text);
            let tags = patch
                .tags
                .map(dedup_tags)
                .filter(|tags| *tags != current.tags);
            (text, tags)
        };

        if text.is_none() && tags.is_none() {
            debug!("event=note_change module=store status=skipped note_id={id} reason=unchanged");
            self.flush()?;
            return Ok(false);
        }

        let registered = tags
            .as_deref()
            .map_or(false, |tags| self.register_tags(tags));
        let now = self.clock.now_ms();
        let note = &mut self.notes[index];
        let text_changed = text.is_some();
        let tags_changed = tags.is_some();
        if let Some(text) = text {
            note.text = text;
        }
        if let Some(tags) = tags {
            note.tags = tags;
        }
        note.last_update = now;

        self.tags_dirty |= registered;
        self.notes_dirty = true;
        self.flush()?;

        debug!(
            "event=note_change module=store status=ok note_id={id} text_changed={text_changed} tags_changed={tags_changed}"
        );
        Ok(true)
    }

    /// Registers a tag. Returns `false` when it already existed.
    pub fn add_tag(&mut self, name: impl Into<String>) -> StoreResult<bool> {
        if !self.tags.insert(name.into()) {
            self.flush()?;
            return Ok(false);
        }
        self.tags_dirty = true;
        self.flush()?;

        debug!(
            "event=tag_add module=store status=ok tags={}",
            self.tags.len()
        );
        Ok(true)
    }

    /// Removes a tag from the global set and from every note using it.
    ///
    /// Affected notes keep their `last_update`. Returns `false` when the tag
    /// was not registered.
    pub fn delete_tag(&mut self, name: &str) -> StoreResult<bool> {
        if !self.tags.contains(name) {
            self.flush()?;
            return Ok(false);
        }

        let mut affected = 0usize;
        let notes: Vec<Note> = self
            .notes
            .iter()
            .map(|note| {
                if !note.has_tag(name) {
                    return note.clone();
                }
                affected += 1;
                Note {
                    tags: note.tags.iter().filter(|tag| *tag != name).cloned().collect(),
                    ..note.clone()
                }
            })
            .collect();

        self.tags.remove(name);
        self.notes = notes;

        self.tags_dirty = true;
        self.notes_dirty |= affected > 0;
        self.flush()?;

        debug!("event=tag_delete module=store status=ok affected_notes={affected}");
        Ok(true)
    }

    /// Renames a tag globally and in every note using it.
    ///
    /// Renaming onto an existing tag merges the two; a note holding both keeps
    /// a single entry at the earlier of the two positions. Affected notes keep
    /// their `last_update`. Returns `false` when `old` is not registered or
    /// equals `new`.
    pub fn rename_tag(&mut self, old: &str, new: impl Into<String>) -> StoreResult<bool> {
        let new = new.into();
        if old == new || !self.tags.contains(old) {
            self.flush()?;
            return Ok(false);
        }

        let merged = self.tags.contains(&new);
        let mut affected = 0usize;
        let notes: Vec<Note> = self
            .notes
            .iter()
            .map(|note| {
                if !note.has_tag(old) {
                    return note.clone();
                }
                affected += 1;
                Note {
                    tags: rename_in_tag_list(&note.tags, old, &new),
                    ..note.clone()
                }
            })
            .collect();

        self.tags.remove(old);
        self.tags.insert(new);
        self.notes = notes;

        self.tags_dirty = true;
        self.notes_dirty |= affected > 0;
        self.flush()?;

        debug!(
            "event=tag_rename module=store status=ok merged={merged} affected_notes={affected}"
        );
        Ok(true)
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.filters.sort = sort;
    }

    /// Sets the exact-tag filter; an empty string clears it.
    pub fn set_tag_filter(&mut self, tag: impl Into<String>) {
        self.filters.tag = tag.into();
    }

    /// Sets the text filter after checking that it compiles.
    ///
    /// # Errors
    /// - `StoreError::InvalidPattern` when the pattern is malformed; the
    ///   previous filter stays active.
    pub fn set_includes(&mut self, includes: impl Into<String>) -> StoreResult<()> {
        let includes = includes.into();
        if !includes.is_empty() {
            compile_pattern(&includes)?;
        }
        self.filters.includes = includes;
        Ok(())
    }

    /// Replaces the whole filter specification.
    ///
    /// # Errors
    /// - `StoreError::InvalidPattern` when `filters.includes` is malformed.
    pub fn set_filters(&mut self, filters: FilterSpec) -> StoreResult<()> {
        if !filters.includes.is_empty() {
            compile_pattern(&filters.includes)?;
        }
        self.filters = filters;
        Ok(())
    }

    fn position(&self, id: NoteId) -> StoreResult<usize> {
        self.notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Adds unknown tags to the global set; returns whether the set grew.
    fn register_tags(&mut self, tags: &[String]) -> bool {
        let mut grew = false;
        for tag in tags {
            grew |= self.tags.insert(tag.clone());
        }
        grew
    }

    fn repair_integrity(&mut self) -> (bool, bool) {
        let mut seen_ids = HashSet::with_capacity(self.notes.len());
        let mut notes_repaired = false;
        let mut tags_repaired = false;

        for note in &mut self.notes {
            let invalid_id = if note.id.is_nil() {
                Some("nil_id")
            } else if !seen_ids.insert(note.id) {
                Some("duplicate_id")
            } else {
                None
            };
            if let Some(kind) = invalid_id {
                let fresh = Uuid::new_v4();
                warn!(
                    "event=store_repair module=store status=repaired kind={kind} note_id={} new_id={fresh}",
                    note.id
                );
                note.id = fresh;
                seen_ids.insert(fresh);
                notes_repaired = true;
            }

            let before = note.tags.len();
            note.tags = dedup_tags(std::mem::take(&mut note.tags));
            if note.tags.len() != before {
                warn!(
                    "event=store_repair module=store status=repaired kind=duplicate_tag note_id={}",
                    note.id
                );
                notes_repaired = true;
            }

            for tag in &note.tags {
                if self.tags.insert(tag.clone()) {
                    warn!(
                        "event=store_repair module=store status=repaired kind=unregistered_tag note_id={}",
                        note.id
                    );
                    tags_repaired = true;
                }
            }
        }

        (notes_repaired, tags_repaired)
    }
}

/// Replaces `old` with `new` and collapses the duplicates this may create,
/// keeping the earliest position.
fn rename_in_tag_list(tags: &[String], old: &str, new: &str) -> Vec<String> {
    dedup_tags(
        tags.iter()
            .map(|tag| {
                if tag == old {
                    new.to_string()
                } else {
                    tag.clone()
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::rename_in_tag_list;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn rename_merge_keeps_earliest_position() {
        assert_eq!(
            rename_in_tag_list(&strings(&["x", "b", "a"]), "a", "b"),
            strings(&["x", "b"])
        );
        assert_eq!(
            rename_in_tag_list(&strings(&["a", "x", "b"]), "a", "b"),
            strings(&["b", "x"])
        );
    }

    #[test]
    fn rename_without_collision_replaces_in_place() {
        assert_eq!(
            rename_in_tag_list(&strings(&["x", "a", "y"]), "a", "z"),
            strings(&["x", "z", "y"])
        );
    }
}
