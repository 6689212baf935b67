use notekeep_core::persist::{load_snapshot, NOTES_KEY, TAGS_KEY};
use notekeep_core::{
    FixedClock, KeyValueBackend, MemoryBackend, NoteDraft, NoteStore, PersistError,
    PersistResult, StoreError,
};
use rusqlite::ffi;
use std::cell::Cell;
use std::rc::Rc;

/// Memory backend that rejects writes to one key while its switch is on.
struct FlakyBackend {
    inner: MemoryBackend,
    failing_key: &'static str,
    failing: Rc<Cell<bool>>,
}

impl FlakyBackend {
    fn new(failing_key: &'static str) -> (Self, Rc<Cell<bool>>) {
        let failing = Rc::new(Cell::new(false));
        let backend = Self {
            inner: MemoryBackend::new(),
            failing_key,
            failing: Rc::clone(&failing),
        };
        (backend, failing)
    }
}

impl KeyValueBackend for FlakyBackend {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        if self.failing.get() && key == self.failing_key {
            return Err(PersistError::from(rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_FULL),
                Some(format!("write to `{key}` refused")),
            )));
        }
        self.inner.set(key, value)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn failed_tag_write_still_saves_notes_and_retry_resyncs() {
    let (backend, failing) = FlakyBackend::new(TAGS_KEY);
    let mut store = NoteStore::open(backend, FixedClock::new(10)).unwrap();
    let note = store.add_note(NoteDraft::new("target")).unwrap();

    failing.set(true);
    let err = store.set_note_tags(note.id, strings(&["x"])).unwrap_err();
    assert!(matches!(err, StoreError::Persist(_)));
    assert_eq!(store.get_note(note.id).unwrap().tags, strings(&["x"]));
    assert!(store.has_unsaved_changes());

    let durable = load_snapshot(store.backend()).unwrap();
    assert_eq!(durable.notes[0].tags, strings(&["x"]));
    assert!(!durable.tags.contains("x"));

    failing.set(false);
    assert!(!store.set_note_tags(note.id, strings(&["x"])).unwrap());
    assert!(!store.has_unsaved_changes());

    let durable = load_snapshot(store.backend()).unwrap();
    assert_eq!(durable.notes[0].tags, strings(&["x"]));
    assert!(durable.tags.contains("x"));
}

#[test]
fn failed_notes_write_is_recovered_by_flush() {
    let (backend, failing) = FlakyBackend::new(NOTES_KEY);
    let mut store = NoteStore::open(backend, FixedClock::new(10)).unwrap();

    failing.set(true);
    let err = store
        .add_note(NoteDraft::new("pending").with_tags(["new"]))
        .unwrap_err();
    assert!(matches!(err, StoreError::Persist(_)));

    let durable = load_snapshot(store.backend()).unwrap();
    assert!(durable.notes.is_empty());
    assert!(durable.tags.contains("new"));

    assert!(matches!(store.flush(), Err(StoreError::Persist(_))));
    assert!(store.has_unsaved_changes());

    failing.set(false);
    store.flush().unwrap();
    assert!(!store.has_unsaved_changes());
    let durable = load_snapshot(store.backend()).unwrap();
    assert_eq!(durable.notes, store.notes());
}

#[test]
fn no_op_operations_write_nothing_when_clean() {
    let (backend, _failing) = FlakyBackend::new(TAGS_KEY);
    let mut store = NoteStore::open(backend, FixedClock::new(0)).unwrap();
    store.add_tag("a").unwrap();
    let writes = store.backend().inner.write_count();

    assert!(!store.add_tag("a").unwrap());
    assert!(!store.delete_tag("missing").unwrap());
    assert!(!store.rename_tag("missing", "b").unwrap());
    store.flush().unwrap();

    assert_eq!(store.backend().inner.write_count(), writes);
}
