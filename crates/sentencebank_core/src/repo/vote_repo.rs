//! Vote ledger persistence: append-only vote log plus counter updates.
//!
//! # Responsibility
//! - Answer "has this client voted on this sentence" reads.
//! - Record one vote per (sentence, client): counter increment plus log
//!   append in a single immediate transaction.
//!
//! # Invariants
//! - `vote_log` rows are append-only; nothing here updates or deletes them.
//! - The duplicate check and the existence check both complete before any
//!   counter mutation.
//! - The unique index on (sentence_id, client_id) is the serializing
//!   backstop; its violation maps to `DuplicateVote`, never a raw DB error.

use crate::model::sentence::{SentenceId, VoteRecord, VoteTally};
use crate::repo::sentence_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, TransactionBehavior};

/// Repository interface for the vote ledger.
pub trait VoteRepository {
    /// Returns whether a vote record exists for the pair.
    fn has_voted(&self, sentence_id: SentenceId, client_id: &str) -> RepoResult<bool>;
    /// Records one vote and returns the updated counter pair.
    fn record_vote(
        &mut self,
        sentence_id: SentenceId,
        client_id: &str,
        positive: bool,
    ) -> RepoResult<VoteTally>;
    /// Reads the audit log for one sentence, oldest first.
    fn votes_for(&self, sentence_id: SentenceId) -> RepoResult<Vec<VoteRecord>>;
}

/// SQLite-backed vote ledger.
pub struct SqliteVoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteVoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl VoteRepository for SqliteVoteRepository<'_> {
    fn has_voted(&self, sentence_id: SentenceId, client_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM vote_log
                WHERE sentence_id = ?1 AND client_id = ?2
            );",
            params![sentence_id, client_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn record_vote(
        &mut self,
        sentence_id: SentenceId,
        client_id: &str,
        positive: bool,
    ) -> RepoResult<VoteTally> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let already_voted: i64 = tx.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM vote_log
                WHERE sentence_id = ?1 AND client_id = ?2
            );",
            params![sentence_id, client_id],
            |row| row.get(0),
        )?;
        if already_voted == 1 {
            return Err(RepoError::DuplicateVote {
                sentence_id,
                client_id: client_id.to_string(),
            });
        }

        let counter_sql = if positive {
            "UPDATE sentences
             SET positive_votes = positive_votes + 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;"
        } else {
            "UPDATE sentences
             SET negative_votes = negative_votes + 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;"
        };
        let changed = tx.execute(counter_sql, [sentence_id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(sentence_id));
        }

        if let Err(err) = tx.execute(
            "INSERT INTO vote_log (sentence_id, client_id, positive)
             VALUES (?1, ?2, ?3);",
            params![sentence_id, client_id, i64::from(positive)],
        ) {
            return Err(map_vote_insert_error(err, sentence_id, client_id));
        }

        let tally = tx.query_row(
            "SELECT positive_votes, negative_votes FROM sentences WHERE id = ?1;",
            [sentence_id],
            |row| {
                Ok(VoteTally {
                    positive_votes: row.get(0)?,
                    negative_votes: row.get(1)?,
                })
            },
        )?;

        tx.commit()?;
        Ok(tally)
    }

    fn votes_for(&self, sentence_id: SentenceId) -> RepoResult<Vec<VoteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT sentence_id, client_id, positive, created_at
             FROM vote_log
             WHERE sentence_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([sentence_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let positive: i64 = row.get("positive")?;
            records.push(VoteRecord {
                sentence_id: row.get("sentence_id")?,
                client_id: row.get("client_id")?,
                positive: positive == 1,
                created_at: row.get("created_at")?,
            });
        }
        Ok(records)
    }
}

/// Maps a unique-index violation on the vote log to `DuplicateVote`.
///
/// A concurrent request can slip between the read above and this insert; the
/// index turns that race into the same semantic error the read produces.
fn map_vote_insert_error(
    err: rusqlite::Error,
    sentence_id: SentenceId,
    client_id: &str,
) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::DuplicateVote {
                sentence_id,
                client_id: client_id.to_string(),
            }
        }
        _ => err.into(),
    }
}
