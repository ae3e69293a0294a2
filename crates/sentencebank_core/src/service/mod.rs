//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep transport-facing layers decoupled from storage details.

pub mod sentence_service;
pub mod vote_service;
