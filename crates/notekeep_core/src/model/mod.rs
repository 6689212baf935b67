//! Domain model for notes and their tag lists.
//!
//! # Responsibility
//! - Define the canonical note record shared by store, query and persistence.
//! - Keep tag-list normalization rules in one place.
//!
//! # Invariants
//! - Every note is identified by a stable, non-nil `NoteId`.
//! - A note's tag list never holds the same name twice.

pub mod note;
