use notekeep_core::{FixedClock, MemoryBackend, NoteDraft, NoteStore};
use std::collections::BTreeSet;

type TestStore = NoteStore<MemoryBackend, FixedClock>;

fn new_store() -> (TestStore, FixedClock) {
    let clock = FixedClock::new(100);
    let store = NoteStore::open(MemoryBackend::new(), clock.clone()).unwrap();
    (store, clock)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn tag_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn assert_consistent(store: &TestStore) {
    for note in store.notes() {
        for tag in &note.tags {
            assert!(
                store.tags().contains(tag),
                "note {} references unregistered tag `{tag}`",
                note.id
            );
        }
        let unique: BTreeSet<_> = note.tags.iter().collect();
        assert_eq!(unique.len(), note.tags.len(), "note {} has duplicate tags", note.id);
    }
}

#[test]
fn add_tag_is_set_insert() {
    let (mut store, _clock) = new_store();

    assert!(store.add_tag("work").unwrap());
    let writes = store.backend().write_count();
    assert!(!store.add_tag("work").unwrap());

    assert_eq!(store.tags(), &tag_set(&["work"]));
    assert_eq!(store.backend().write_count(), writes);
}

#[test]
fn tags_are_case_sensitive() {
    let (mut store, _clock) = new_store();
    store.add_tag("Work").unwrap();
    store.add_tag("work").unwrap();
    assert_eq!(store.tags().len(), 2);
}

#[test]
fn delete_tag_cascades_to_every_note() {
    let (mut store, clock) = new_store();
    let a = store
        .add_note(NoteDraft::new("A").with_tags(["work", "home"]))
        .unwrap();
    let b = store
        .add_note(NoteDraft::new("B").with_tags(["work"]))
        .unwrap();
    let c = store
        .add_note(NoteDraft::new("C").with_tags(["home"]))
        .unwrap();

    clock.advance(1_000);
    assert!(store.delete_tag("work").unwrap());

    assert_eq!(store.tags(), &tag_set(&["home"]));
    let a_after = store.get_note(a.id).unwrap();
    let b_after = store.get_note(b.id).unwrap();
    assert_eq!(a_after.tags, strings(&["home"]));
    assert!(b_after.tags.is_empty());
    assert_eq!(store.get_note(c.id).unwrap(), &c);

    assert_eq!(a_after.text, a.text);
    assert_eq!(a_after.last_update, a.last_update);
    assert_eq!(b_after.last_update, b.last_update);
    assert_consistent(&store);
}

#[test]
fn delete_unknown_tag_is_a_no_op() {
    let (mut store, _clock) = new_store();
    store.add_tag("keep").unwrap();
    let writes = store.backend().write_count();

    assert!(!store.delete_tag("missing").unwrap());
    assert_eq!(store.backend().write_count(), writes);
}

#[test]
fn rename_tag_cascades_without_bumping_timestamps() {
    let (mut store, clock) = new_store();
    let note = store
        .add_note(NoteDraft::new("report").with_tags(["x", "wrk", "y"]))
        .unwrap();

    clock.advance(500);
    assert!(store.rename_tag("wrk", "work").unwrap());

    let renamed = store.get_note(note.id).unwrap();
    assert_eq!(renamed.tags, strings(&["x", "work", "y"]));
    assert_eq!(renamed.last_update, note.last_update);
    assert_eq!(store.tags(), &tag_set(&["work", "x", "y"]));
}

#[test]
fn rename_onto_existing_tag_merges() {
    let (mut store, _clock) = new_store();
    store.add_tag("a").unwrap();
    store.add_tag("b").unwrap();
    let note = store.add_note(NoteDraft::new("n").with_tags(["a"])).unwrap();

    assert!(store.rename_tag("a", "b").unwrap());

    assert_eq!(store.tags(), &tag_set(&["b"]));
    assert_eq!(store.get_note(note.id).unwrap().tags, strings(&["b"]));
}

#[test]
fn rename_merge_collapses_notes_holding_both_tags() {
    let (mut store, _clock) = new_store();
    let later_old = store
        .add_note(NoteDraft::new("one").with_tags(["b", "z", "a"]))
        .unwrap();
    let earlier_old = store
        .add_note(NoteDraft::new("two").with_tags(["a", "z", "b"]))
        .unwrap();

    store.rename_tag("a", "b").unwrap();

    assert_eq!(store.get_note(later_old.id).unwrap().tags, strings(&["b", "z"]));
    assert_eq!(store.get_note(earlier_old.id).unwrap().tags, strings(&["b", "z"]));
    assert_consistent(&store);
}

#[test]
fn rename_of_absent_or_identical_tag_is_a_no_op() {
    let (mut store, _clock) = new_store();
    store.add_tag("a").unwrap();
    let writes = store.backend().write_count();

    assert!(!store.rename_tag("missing", "other").unwrap());
    assert!(!store.rename_tag("a", "a").unwrap());

    assert_eq!(store.tags(), &tag_set(&["a"]));
    assert_eq!(store.backend().write_count(), writes);
}

#[test]
fn mixed_operation_sequence_preserves_integrity() {
    let (mut store, clock) = new_store();
    let n1 = store
        .add_note(NoteDraft::new("n1").with_tags(["a", "b"]))
        .unwrap();
    let n2 = store
        .add_note(NoteDraft::new("n2").with_tags(["b", "c"]))
        .unwrap();
    assert_consistent(&store);

    clock.advance(1);
    store.set_note_tags(n1.id, strings(&["c", "d"])).unwrap();
    assert_consistent(&store);

    store.rename_tag("c", "d").unwrap();
    assert_consistent(&store);
    assert_eq!(store.get_note(n1.id).unwrap().tags, strings(&["d"]));
    assert_eq!(store.get_note(n2.id).unwrap().tags, strings(&["b", "d"]));

    store.delete_tag("d").unwrap();
    assert_consistent(&store);
    assert!(store.get_note(n1.id).unwrap().tags.is_empty());

    store.remove_note(n2.id).unwrap();
    assert_consistent(&store);
    assert_eq!(store.tags(), &tag_set(&["a", "b"]));
}
