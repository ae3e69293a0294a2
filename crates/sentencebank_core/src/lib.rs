//! Core domain logic for sentencebank.
//! This crate is the single source of truth for business invariants:
//! pseudo-random selection, tag-edge reconciliation, and the one-vote-per-
//! client ledger.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::sentence::{
    AuthorId, AuthorRef, NewSentence, Sentence, SentenceId, SentenceUpdate,
    SentenceValidationError, TagDelta, TagId, VoteRecord, VoteTally,
};
pub use repo::sentence_repo::{
    insert_author, insert_tag, RepoError, RepoResult, SentenceRepository,
    SqliteSentenceRepository,
};
pub use repo::vote_repo::{SqliteVoteRepository, VoteRepository};
pub use service::sentence_service::{
    SentenceService, SentenceServiceError, MAX_RANDOM_ATTEMPTS,
};
pub use service::vote_service::{VoteService, VoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
