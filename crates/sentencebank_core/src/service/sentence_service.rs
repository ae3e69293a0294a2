//! Sentence use-case service.
//!
//! # Responsibility
//! - Provide create/update/get entry points over the sentence repository.
//! - Reconcile tag associations through add/remove/clear deltas.
//! - Select a pseudo-random sentence without a full-table random-order scan.
//!
//! # Invariants
//! - `update_sentence` uses full scalar overwrite semantics; the author
//!   reference is immutable.
//! - Random selection performs at most `MAX_RANDOM_ATTEMPTS` id probes plus
//!   one fallback read after the count.

use crate::model::sentence::{NewSentence, Sentence, SentenceId, SentenceUpdate, TagDelta, TagId};
use crate::repo::sentence_repo::{RepoError, RepoResult, SentenceRepository};
use log::debug;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound on id probes before falling back to the first row.
///
/// Guessing ids instead of ordering the whole table randomly keeps the cost
/// bounded; sparse id spaces (gaps from deletions) make a probe miss, hence
/// the retry budget. The resulting distribution is not uniform over existing
/// rows when gaps are large; that trade-off is deliberate.
pub const MAX_RANDOM_ATTEMPTS: u32 = 5;

/// Service error for sentence use-cases.
#[derive(Debug)]
pub enum SentenceServiceError {
    /// Target sentence does not exist.
    SentenceNotFound(SentenceId),
    /// The store holds no sentences at all.
    Empty,
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for SentenceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SentenceNotFound(id) => write!(f, "sentence not found: {id}"),
            Self::Empty => write!(f, "no sentences stored"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent sentence state: {details}")
            }
        }
    }
}

impl Error for SentenceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SentenceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::SentenceNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Sentence service facade over repository implementations.
pub struct SentenceService<R: SentenceRepository> {
    repo: R,
}

impl<R: SentenceRepository> SentenceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one sentence and syncs the given tag set as its complete
    /// association set.
    pub fn create_sentence(
        &mut self,
        draft: &NewSentence,
        tag_ids: &[TagId],
    ) -> Result<Sentence, SentenceServiceError> {
        let id = self.repo.create_sentence(draft, tag_ids)?;
        self.repo
            .get_sentence(id)?
            .ok_or(SentenceServiceError::InconsistentState(
                "created sentence not found in read-back",
            ))
    }

    /// Overwrites scalar fields, then applies the tag delta when non-empty.
    ///
    /// `delta.clear_all` takes precedence over add/remove, per the
    /// reconciliation contract.
    pub fn update_sentence(
        &mut self,
        id: SentenceId,
        update: &SentenceUpdate,
        delta: &TagDelta,
    ) -> Result<Sentence, SentenceServiceError> {
        self.repo.update_sentence(id, update)?;
        if !delta.is_empty() {
            self.repo.reconcile_tags(id, delta)?;
        }
        self.repo
            .get_sentence(id)?
            .ok_or(SentenceServiceError::InconsistentState(
                "updated sentence not found in read-back",
            ))
    }

    /// Applies a tag delta without touching scalar fields.
    pub fn reconcile_tags(
        &mut self,
        id: SentenceId,
        delta: &TagDelta,
    ) -> Result<Sentence, SentenceServiceError> {
        self.repo.reconcile_tags(id, delta)?;
        self.repo
            .get_sentence(id)?
            .ok_or(SentenceServiceError::InconsistentState(
                "sentence missing after tag reconciliation",
            ))
    }

    /// Gets one sentence by id with author and tags eagerly loaded.
    pub fn get_sentence(&self, id: SentenceId) -> Result<Sentence, SentenceServiceError> {
        self.repo
            .get_sentence(id)?
            .ok_or(SentenceServiceError::SentenceNotFound(id))
    }

    /// Reads the current tag-id set for one sentence.
    pub fn tag_ids(&self, id: SentenceId) -> RepoResult<Vec<TagId>> {
        self.repo.tag_ids(id)
    }

    /// Selects a pseudo-random sentence using the thread-local RNG.
    pub fn random_sentence(&self) -> Result<Sentence, SentenceServiceError> {
        self.random_sentence_with(&mut rand::thread_rng())
    }

    /// Selects a pseudo-random sentence using a caller-provided RNG.
    ///
    /// Draws an id uniformly from `[1, count]` and fetches by exact id, up to
    /// `MAX_RANDOM_ATTEMPTS` times; misses happen when the id space has gaps.
    /// When every probe misses, falls back to the smallest-id row, so any
    /// non-empty store yields a result in at most `MAX_RANDOM_ATTEMPTS + 1`
    /// reads after the count.
    pub fn random_sentence_with<G: Rng>(
        &self,
        rng: &mut G,
    ) -> Result<Sentence, SentenceServiceError> {
        let total = self.repo.count_sentences()?;
        if total == 0 {
            return Err(SentenceServiceError::Empty);
        }
        let upper = i64::try_from(total).map_err(|_| {
            SentenceServiceError::InconsistentState("sentence count exceeds id range")
        })?;

        for attempt in 1..=MAX_RANDOM_ATTEMPTS {
            let id = rng.gen_range(1..=upper);
            if let Some(sentence) = self.repo.get_sentence(id)? {
                debug!(
                    "event=random_select module=service status=hit attempt={attempt} id={id}"
                );
                return Ok(sentence);
            }
        }

        debug!(
            "event=random_select module=service status=fallback attempts={MAX_RANDOM_ATTEMPTS}"
        );
        self.repo
            .first_sentence()?
            .ok_or(SentenceServiceError::Empty)
    }
}
