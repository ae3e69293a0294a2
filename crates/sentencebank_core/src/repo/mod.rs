//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes validate inputs before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateVote`) in
//!   addition to DB transport errors.

pub mod sentence_repo;
pub mod vote_repo;
