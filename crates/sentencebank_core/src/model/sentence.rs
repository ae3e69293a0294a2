//! Sentence domain model.
//!
//! # Responsibility
//! - Define the canonical sentence record and its write-side input shapes.
//! - Provide validation invoked by repository write paths.
//!
//! # Invariants
//! - `id` is store-assigned, positive, and never reused.
//! - `author` is immutable after creation; updates never carry it.
//! - `positive_votes`/`negative_votes` are non-negative and mutated only by
//!   the vote ledger.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned sentence identifier (positive, immutable).
pub type SentenceId = i64;

/// Tag identifier. Tag existence is authoritative in a separate collaborator;
/// core only manipulates association edges keyed by this id.
pub type TagId = i64;

/// Author identifier owned by the accounts collaborator.
pub type AuthorId = i64;

/// Eager-loaded author projection attached to sentence reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: AuthorId,
    pub name: String,
}

/// Canonical sentence read model, author and tags eagerly loaded.
///
/// `tags` is kept sorted ascending so serialized output is stable across
/// reads of the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,
    pub content: String,
    pub author: AuthorRef,
    pub positive_votes: i64,
    pub negative_votes: i64,
    pub tags: Vec<TagId>,
}

/// Write-side input for sentence creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSentence {
    pub content: String,
    pub author_id: AuthorId,
}

/// Write-side input for full-field sentence overwrite.
///
/// Deliberately excludes the author reference: the owner cannot change after
/// creation, so the field is not even representable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceUpdate {
    pub content: String,
}

/// Desired change to a sentence's tag association set.
///
/// `clear_all` takes precedence: when set, `add`/`remove` are ignored and
/// every existing edge is detached. Otherwise `add` is applied first (minus
/// already-present edges) and `remove` after, so an id present in both nets
/// to removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDelta {
    pub add: Vec<TagId>,
    pub remove: Vec<TagId>,
    pub clear_all: bool,
}

impl TagDelta {
    /// Returns true when applying this delta would change nothing.
    pub fn is_empty(&self) -> bool {
        !self.clear_all && self.add.is_empty() && self.remove.is_empty()
    }

    /// Convenience constructor for the clear-everything mode.
    pub fn clear() -> Self {
        Self {
            clear_all: true,
            ..Self::default()
        }
    }
}

/// Aggregate counter pair returned by the vote ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub positive_votes: i64,
    pub negative_votes: i64,
}

/// Immutable audit entry for one recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub sentence_id: SentenceId,
    pub client_id: String,
    pub positive: bool,
    /// Creation time in epoch milliseconds, assigned by the store.
    pub created_at: i64,
}

/// Validation failure for sentence write inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentenceValidationError {
    /// Content is empty or whitespace-only.
    EmptyContent,
    /// Author reference is not a positive identifier.
    InvalidAuthor(AuthorId),
}

impl Display for SentenceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "sentence content must not be empty"),
            Self::InvalidAuthor(id) => write!(f, "invalid author reference: {id}"),
        }
    }
}

impl Error for SentenceValidationError {}

impl NewSentence {
    /// Checks write invariants before the input reaches SQL.
    pub fn validate(&self) -> Result<(), SentenceValidationError> {
        validate_content(&self.content)?;
        if self.author_id <= 0 {
            return Err(SentenceValidationError::InvalidAuthor(self.author_id));
        }
        Ok(())
    }
}

impl SentenceUpdate {
    /// Checks write invariants before the input reaches SQL.
    pub fn validate(&self) -> Result<(), SentenceValidationError> {
        validate_content(&self.content)
    }
}

fn validate_content(content: &str) -> Result<(), SentenceValidationError> {
    if content.trim().is_empty() {
        return Err(SentenceValidationError::EmptyContent);
    }
    Ok(())
}
