//! Note domain model.
//!
//! # Responsibility
//! - Define `Note`, its creation input (`NoteDraft`) and partial update
//!   input (`NotePatch`).
//! - Provide tag-list de-duplication used by every write path.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `last_update` is epoch milliseconds of the last user edit.
//! - Wire field names are `id`, `text`, `tags`, `last_update`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Validation failures for note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Note ids must not be the nil uuid.
    NilId,
    /// New notes require non-blank text.
    EmptyText,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "note id must not be nil"),
            Self::EmptyText => write!(f, "note text must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// One user-authored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    /// Ordered, duplicate-free tag names.
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub last_update: i64,
}

impl Note {
    /// Creates a note with a freshly generated id.
    ///
    /// Tags are de-duplicated, keeping the first occurrence of each name.
    pub fn new(text: impl Into<String>, tags: Vec<String>, last_update: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            tags: dedup_tags(tags),
            last_update,
        }
    }

    /// Creates a note with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        id: NoteId,
        text: impl Into<String>,
        tags: Vec<String>,
        last_update: i64,
    ) -> Result<Self, NoteValidationError> {
        if id.is_nil() {
            return Err(NoteValidationError::NilId);
        }
        Ok(Self {
            id,
            text: text.into(),
            tags: dedup_tags(tags),
            last_update,
        })
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|current| current == tag)
    }
}

/// Input for creating a note. Id and timestamp are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    /// Builder-style helper to attach tags to a draft.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Rejects drafts whose text is empty after trimming.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.text.trim().is_empty() {
            return Err(NoteValidationError::EmptyText);
        }
        Ok(())
    }
}

/// Partial update of a note's user-editable fields.
///
/// `None` leaves a field untouched. `id` and `last_update` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tags: None,
        }
    }

    pub fn tags(tags: Vec<String>) -> Self {
        Self {
            text: None,
            tags: Some(tags),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tags.is_none()
    }
}

/// Removes repeated tag names, keeping the earliest position of each.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
