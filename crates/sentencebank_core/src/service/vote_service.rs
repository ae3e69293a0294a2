//! Vote ledger use-case service.
//!
//! # Responsibility
//! - Record at most one vote per (sentence, client) pair.
//! - Surface the updated counter pair to the transport-facing caller.
//!
//! # Invariants
//! - A rejected vote leaves counters and the vote log untouched.
//! - The client identifier is opaque to core; it only needs to be non-empty
//!   and stable per voter (e.g. an originating network address).

use crate::model::sentence::{SentenceId, VoteRecord, VoteTally};
use crate::repo::sentence_repo::{RepoError, RepoResult};
use crate::repo::vote_repo::VoteRepository;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for vote use-cases.
#[derive(Debug)]
pub enum VoteServiceError {
    /// Target sentence does not exist.
    SentenceNotFound(SentenceId),
    /// This client already voted on this sentence.
    AlreadyVoted {
        sentence_id: SentenceId,
        client_id: String,
    },
    /// Client identifier is empty or whitespace-only.
    InvalidClient(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for VoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SentenceNotFound(id) => write!(f, "sentence not found: {id}"),
            Self::AlreadyVoted {
                sentence_id,
                client_id,
            } => write!(
                f,
                "client `{client_id}` already voted on sentence {sentence_id}"
            ),
            Self::InvalidClient(value) => write!(f, "invalid client identifier: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::SentenceNotFound(id),
            RepoError::DuplicateVote {
                sentence_id,
                client_id,
            } => Self::AlreadyVoted {
                sentence_id,
                client_id,
            },
            other => Self::Repo(other),
        }
    }
}

/// Vote ledger facade over repository implementations.
pub struct VoteService<R: VoteRepository> {
    repo: R,
}

impl<R: VoteRepository> VoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records one up/down vote for the pair and returns the updated
    /// counters.
    ///
    /// Fails with `AlreadyVoted` when a record exists for the pair and with
    /// `SentenceNotFound` when the sentence is absent; neither failure
    /// mutates any state.
    pub fn record_vote(
        &mut self,
        sentence_id: SentenceId,
        client_id: &str,
        positive: bool,
    ) -> Result<VoteTally, VoteServiceError> {
        if client_id.trim().is_empty() {
            return Err(VoteServiceError::InvalidClient(client_id.to_string()));
        }

        let tally = self.repo.record_vote(sentence_id, client_id, positive)?;
        Ok(tally)
    }

    /// Returns whether this client already voted on this sentence.
    pub fn has_voted(&self, sentence_id: SentenceId, client_id: &str) -> RepoResult<bool> {
        self.repo.has_voted(sentence_id, client_id)
    }

    /// Reads the append-only audit log for one sentence, oldest first.
    pub fn votes_for(&self, sentence_id: SentenceId) -> RepoResult<Vec<VoteRecord>> {
        self.repo.votes_for(sentence_id)
    }
}
