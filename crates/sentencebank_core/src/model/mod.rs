//! Domain model for sentences, tag associations, and vote records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep input shapes separate from store-materialized read models.
//!
//! # Invariants
//! - Every sentence is identified by a positive, store-assigned `SentenceId`.
//! - Vote counters only move through the vote ledger.

pub mod sentence;
