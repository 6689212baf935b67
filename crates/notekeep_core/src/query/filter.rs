//! Note filtering and ordering.
//!
//! # Invariants
//! - Steps run in fixed order: tag membership, text pattern, sort.
//! - Sorting is stable; notes with equal `last_update` keep input order.
//! - Output is a fresh `Vec` of cloned notes.

use crate::model::note::Note;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for query APIs.
pub type QueryResult<T> = Result<T, QueryError>;

/// Query-layer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// User-provided `includes` text is not a valid pattern.
    InvalidPattern { pattern: String, message: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid search pattern `{pattern}`: {message}")
            }
        }
    }
}

impl Error for QueryError {}

/// Ordering by `last_update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

/// View parameters for the visible note list. Empty strings match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub sort: SortOrder,
    /// Case-insensitive, Unicode-aware regex over the note text.
    pub includes: String,
    /// Exact tag name a note must carry.
    pub tag: String,
}

impl FilterSpec {
    pub fn new(sort: SortOrder) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn with_includes(mut self, includes: impl Into<String>) -> Self {
        self.includes = includes.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// Compiles an `includes` pattern the way `apply_filter` uses it.
///
/// # Errors
/// - `QueryError::InvalidPattern` when the regex syntax is malformed.
pub fn compile_pattern(pattern: &str) -> QueryResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .map_err(|err| QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}

/// Produces the ordered sequence of notes matching `spec`.
///
/// # Errors
/// - `QueryError::InvalidPattern` when `spec.includes` is non-empty and
///   malformed. The error is returned rather than treated as "match nothing".
pub fn apply_filter(notes: &[Note], spec: &FilterSpec) -> QueryResult<Vec<Note>> {
    let pattern = if spec.includes.is_empty() {
        None
    } else {
        Some(compile_pattern(&spec.includes)?)
    };

    let mut visible: Vec<Note> = notes
        .iter()
        .filter(|note| spec.tag.is_empty() || note.has_tag(&spec.tag))
        .filter(|note| {
            pattern
                .as_ref()
                .map_or(true, |regex| regex.is_match(&note.text))
        })
        .cloned()
        .collect();

    match spec.sort {
        SortOrder::Ascending => visible.sort_by(|a, b| a.last_update.cmp(&b.last_update)),
        SortOrder::Descending => visible.sort_by(|a, b| b.last_update.cmp(&a.last_update)),
    }

    Ok(visible)
}
