//! Sentence repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide sentence CRUD plus count/first-row reads used by random
//!   selection.
//! - Own tag-edge reconciliation (delta and full-replacement modes) with
//!   transactional semantics.
//!
//! # Invariants
//! - All sentence reads eager-load the author row and the tag-id set.
//! - Tag-edge mutations run inside one immediate transaction; a sentence
//!   that does not exist fails with `NotFound` before any edge is touched.
//! - `author_id` is never part of an UPDATE statement.

use crate::db::DbError;
use crate::model::sentence::{
    AuthorId, AuthorRef, NewSentence, Sentence, SentenceId, SentenceUpdate,
    SentenceValidationError, TagDelta, TagId,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SENTENCE_SELECT_SQL: &str = "SELECT
    s.id,
    s.content,
    s.author_id,
    a.name AS author_name,
    s.positive_votes,
    s.negative_votes
FROM sentences s
INNER JOIN authors a ON a.id = s.author_id";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for sentence persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(SentenceValidationError),
    Db(DbError),
    NotFound(SentenceId),
    DuplicateVote {
        sentence_id: SentenceId,
        client_id: String,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "sentence not found: {id}"),
            Self::DuplicateVote {
                sentence_id,
                client_id,
            } => write!(
                f,
                "client `{client_id}` already voted on sentence {sentence_id}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted sentence data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateVote { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<SentenceValidationError> for RepoError {
    fn from(value: SentenceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for sentence CRUD and tag-edge operations.
pub trait SentenceRepository {
    /// Creates one sentence and syncs its full tag set in one transaction.
    fn create_sentence(&mut self, draft: &NewSentence, tag_ids: &[TagId]) -> RepoResult<SentenceId>;
    /// Overwrites scalar fields; the author reference is never touched.
    fn update_sentence(&self, id: SentenceId, update: &SentenceUpdate) -> RepoResult<()>;
    /// Gets one sentence by id with author and tags eagerly loaded.
    fn get_sentence(&self, id: SentenceId) -> RepoResult<Option<Sentence>>;
    /// Counts all sentences.
    fn count_sentences(&self) -> RepoResult<u64>;
    /// Returns the sentence with the smallest id, if any.
    fn first_sentence(&self) -> RepoResult<Option<Sentence>>;
    /// Applies an add/remove/clear delta to the tag-edge set in one
    /// transaction.
    fn reconcile_tags(&mut self, id: SentenceId, delta: &TagDelta) -> RepoResult<()>;
    /// Replaces the whole tag-edge set in one transaction.
    fn set_tags(&mut self, id: SentenceId, tag_ids: &[TagId]) -> RepoResult<()>;
    /// Reads the current tag-id set, sorted ascending.
    fn tag_ids(&self, id: SentenceId) -> RepoResult<Vec<TagId>>;
}

/// SQLite-backed sentence repository.
pub struct SqliteSentenceRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSentenceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl SentenceRepository for SqliteSentenceRepository<'_> {
    fn create_sentence(&mut self, draft: &NewSentence, tag_ids: &[TagId]) -> RepoResult<SentenceId> {
        draft.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO sentences (content, author_id) VALUES (?1, ?2);",
            params![draft.content.as_str(), draft.author_id],
        )?;
        let id = tx.last_insert_rowid();

        for tag_id in distinct_tags(tag_ids) {
            attach_tag_in_tx(&tx, id, tag_id)?;
        }

        tx.commit()?;
        Ok(id)
    }

    fn update_sentence(&self, id: SentenceId, update: &SentenceUpdate) -> RepoResult<()> {
        update.validate()?;

        let changed = self.conn.execute(
            "UPDATE sentences
             SET
                content = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, update.content.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_sentence(&self, id: SentenceId) -> RepoResult<Option<Sentence>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SENTENCE_SELECT_SQL} WHERE s.id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut sentence = parse_sentence_row(row)?;
            sentence.tags = load_tag_ids(self.conn, sentence.id)?;
            return Ok(Some(sentence));
        }

        Ok(None)
    }

    fn count_sentences(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sentences;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative sentence count `{count}`")))
    }

    fn first_sentence(&self) -> RepoResult<Option<Sentence>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SENTENCE_SELECT_SQL} ORDER BY s.id ASC LIMIT 1;"))?;

        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            let mut sentence = parse_sentence_row(row)?;
            sentence.tags = load_tag_ids(self.conn, sentence.id)?;
            return Ok(Some(sentence));
        }

        Ok(None)
    }

    fn reconcile_tags(&mut self, id: SentenceId, delta: &TagDelta) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !sentence_exists_in_tx(&tx, id)? {
            return Err(RepoError::NotFound(id));
        }

        if delta.clear_all {
            // Clearing takes precedence; add/remove are ignored in this mode.
            tx.execute("DELETE FROM sentence_tags WHERE sentence_id = ?1;", [id])?;
        } else {
            if !delta.add.is_empty() {
                let current = load_tag_ids_in_tx(&tx, id)?;
                for tag_id in missing_tags(&delta.add, &current) {
                    attach_tag_in_tx(&tx, id, tag_id)?;
                }
            }

            // Removal is applied after addition, so an id present in both
            // deltas nets to removal. Detaching an absent edge is a no-op.
            for tag_id in distinct_tags(&delta.remove) {
                tx.execute(
                    "DELETE FROM sentence_tags WHERE sentence_id = ?1 AND tag_id = ?2;",
                    params![id, tag_id],
                )?;
            }
        }

        touch_sentence_in_tx(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    fn set_tags(&mut self, id: SentenceId, tag_ids: &[TagId]) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !sentence_exists_in_tx(&tx, id)? {
            return Err(RepoError::NotFound(id));
        }

        tx.execute("DELETE FROM sentence_tags WHERE sentence_id = ?1;", [id])?;
        for tag_id in distinct_tags(tag_ids) {
            attach_tag_in_tx(&tx, id, tag_id)?;
        }

        touch_sentence_in_tx(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    fn tag_ids(&self, id: SentenceId) -> RepoResult<Vec<TagId>> {
        load_tag_ids(self.conn, id)
    }
}

/// Deduplicates and sorts tag ids from caller input.
pub fn distinct_tags(ids: &[TagId]) -> Vec<TagId> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Computes `desired − current`: the ids that still need an edge.
///
/// Already-associated ids are silently skipped, never duplicated.
pub fn missing_tags(desired: &[TagId], current: &[TagId]) -> Vec<TagId> {
    let existing: BTreeSet<TagId> = current.iter().copied().collect();
    distinct_tags(desired)
        .into_iter()
        .filter(|id| !existing.contains(id))
        .collect()
}

/// Inserts one author row. Authors are owned by the accounts collaborator;
/// this helper exists for wiring and tests, not as a core operation.
pub fn insert_author(conn: &Connection, name: &str) -> RepoResult<AuthorId> {
    conn.execute("INSERT INTO authors (name) VALUES (?1);", [name])?;
    Ok(conn.last_insert_rowid())
}

/// Inserts one tag row. Tag catalog management lives in a separate
/// collaborator; this helper exists for wiring and tests.
pub fn insert_tag(conn: &Connection, name: &str) -> RepoResult<TagId> {
    conn.execute("INSERT INTO tags (name) VALUES (?1);", [name])?;
    Ok(conn.last_insert_rowid())
}

fn parse_sentence_row(row: &Row<'_>) -> RepoResult<Sentence> {
    let id: SentenceId = row.get("id")?;
    if id <= 0 {
        return Err(RepoError::InvalidData(format!(
            "non-positive id `{id}` in sentences.id"
        )));
    }

    Ok(Sentence {
        id,
        content: row.get("content")?,
        author: AuthorRef {
            id: row.get("author_id")?,
            name: row.get("author_name")?,
        },
        positive_votes: row.get("positive_votes")?,
        negative_votes: row.get("negative_votes")?,
        tags: Vec::new(),
    })
}

fn load_tag_ids(conn: &Connection, id: SentenceId) -> RepoResult<Vec<TagId>> {
    let mut stmt = conn.prepare(
        "SELECT tag_id
         FROM sentence_tags
         WHERE sentence_id = ?1
         ORDER BY tag_id ASC;",
    )?;
    let mut rows = stmt.query([id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn load_tag_ids_in_tx(tx: &Transaction<'_>, id: SentenceId) -> RepoResult<Vec<TagId>> {
    load_tag_ids(tx, id)
}

fn attach_tag_in_tx(tx: &Transaction<'_>, id: SentenceId, tag_id: TagId) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO sentence_tags (sentence_id, tag_id) VALUES (?1, ?2);",
        params![id, tag_id],
    )?;
    Ok(())
}

fn touch_sentence_in_tx(tx: &Transaction<'_>, id: SentenceId) -> RepoResult<()> {
    tx.execute(
        "UPDATE sentences
         SET updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        [id],
    )?;
    Ok(())
}

fn sentence_exists_in_tx(tx: &Transaction<'_>, id: SentenceId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM sentences WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
