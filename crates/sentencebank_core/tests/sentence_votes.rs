use rusqlite::Connection;
use sentencebank_core::db::open_db_in_memory;
use sentencebank_core::{
    insert_author, NewSentence, SentenceRepository, SqliteSentenceRepository,
    SqliteVoteRepository, VoteService, VoteServiceError,
};

fn db_with_sentence() -> (Connection, i64) {
    let mut conn = open_db_in_memory().unwrap();
    let author_id = insert_author(&conn, "ada").unwrap();
    let sentence_id = {
        let mut repo = SqliteSentenceRepository::new(&mut conn);
        repo.create_sentence(
            &NewSentence {
                content: "vote target".to_string(),
                author_id,
            },
            &[],
        )
        .unwrap()
    };
    (conn, sentence_id)
}

fn vote_log_rows(conn: &Connection, sentence_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM vote_log WHERE sentence_id = ?1;",
        [sentence_id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn first_vote_increments_counter_and_appends_one_record() {
    let (mut conn, sentence_id) = db_with_sentence();

    let tally = {
        let repo = SqliteVoteRepository::new(&mut conn);
        let mut ledger = VoteService::new(repo);
        ledger.record_vote(sentence_id, "10.0.0.1", true).unwrap()
    };
    assert_eq!(tally.positive_votes, 1);
    assert_eq!(tally.negative_votes, 0);
    assert_eq!(vote_log_rows(&conn, sentence_id), 1);

    let repo = SqliteVoteRepository::new(&mut conn);
    let ledger = VoteService::new(repo);
    let records = ledger.votes_for(sentence_id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].client_id, "10.0.0.1");
    assert!(records[0].positive);
    assert!(records[0].created_at > 0);
}

#[test]
fn second_vote_from_same_client_is_rejected_without_side_effects() {
    let (mut conn, sentence_id) = db_with_sentence();

    {
        let repo = SqliteVoteRepository::new(&mut conn);
        let mut ledger = VoteService::new(repo);
        ledger.record_vote(sentence_id, "10.0.0.1", true).unwrap();

        let err = ledger
            .record_vote(sentence_id, "10.0.0.1", false)
            .unwrap_err();
        match err {
            VoteServiceError::AlreadyVoted {
                sentence_id: id,
                client_id,
            } => {
                assert_eq!(id, sentence_id);
                assert_eq!(client_id, "10.0.0.1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    let (positive, negative): (i64, i64) = conn
        .query_row(
            "SELECT positive_votes, negative_votes FROM sentences WHERE id = ?1;",
            [sentence_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((positive, negative), (1, 0));
    assert_eq!(vote_log_rows(&conn, sentence_id), 1);
}

#[test]
fn distinct_clients_each_get_one_vote() {
    let (mut conn, sentence_id) = db_with_sentence();

    let repo = SqliteVoteRepository::new(&mut conn);
    let mut ledger = VoteService::new(repo);
    ledger.record_vote(sentence_id, "10.0.0.1", true).unwrap();
    let tally = ledger.record_vote(sentence_id, "10.0.0.2", false).unwrap();

    assert_eq!(tally.positive_votes, 1);
    assert_eq!(tally.negative_votes, 1);
    assert!(ledger.has_voted(sentence_id, "10.0.0.1").unwrap());
    assert!(ledger.has_voted(sentence_id, "10.0.0.2").unwrap());
    assert!(!ledger.has_voted(sentence_id, "10.0.0.3").unwrap());
}

#[test]
fn positive_vote_leaves_negative_counter_untouched() {
    let (mut conn, sentence_id) = db_with_sentence();
    conn.execute(
        "UPDATE sentences SET positive_votes = 3, negative_votes = 2 WHERE id = ?1;",
        [sentence_id],
    )
    .unwrap();

    let repo = SqliteVoteRepository::new(&mut conn);
    let mut ledger = VoteService::new(repo);
    let tally = ledger.record_vote(sentence_id, "10.0.0.9", true).unwrap();

    assert_eq!(tally.positive_votes, 4);
    assert_eq!(tally.negative_votes, 2);
}

#[test]
fn vote_on_missing_sentence_returns_not_found_and_logs_nothing() {
    let (mut conn, sentence_id) = db_with_sentence();
    let missing = sentence_id + 50;

    {
        let repo = SqliteVoteRepository::new(&mut conn);
        let mut ledger = VoteService::new(repo);
        let err = ledger.record_vote(missing, "10.0.0.1", true).unwrap_err();
        match err {
            VoteServiceError::SentenceNotFound(id) => assert_eq!(id, missing),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(vote_log_rows(&conn, missing), 0);
}

#[test]
fn empty_client_identifier_is_rejected() {
    let (mut conn, sentence_id) = db_with_sentence();

    let repo = SqliteVoteRepository::new(&mut conn);
    let mut ledger = VoteService::new(repo);
    let err = ledger.record_vote(sentence_id, "  ", true).unwrap_err();
    match err {
        VoteServiceError::InvalidClient(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(vote_log_rows(&conn, sentence_id), 0);
}

#[test]
fn pre_existing_log_row_blocks_the_vote() {
    let (mut conn, sentence_id) = db_with_sentence();
    conn.execute(
        "INSERT INTO vote_log (sentence_id, client_id, positive) VALUES (?1, '10.0.0.7', 1);",
        [sentence_id],
    )
    .unwrap();

    let repo = SqliteVoteRepository::new(&mut conn);
    let mut ledger = VoteService::new(repo);
    let err = ledger.record_vote(sentence_id, "10.0.0.7", true).unwrap_err();
    assert!(matches!(err, VoteServiceError::AlreadyVoted { .. }));
}
