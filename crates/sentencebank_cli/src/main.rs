//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `sentencebank_core` linkage.
//! - Run the create/vote/random flow against an in-memory store so the
//!   wiring can be sanity-checked without any HTTP layer.

use sentencebank_core::db::open_db_in_memory;
use sentencebank_core::{
    insert_author, insert_tag, NewSentence, SentenceService, SqliteSentenceRepository,
    SqliteVoteRepository, VoteService,
};

fn main() {
    println!("sentencebank_core version={}", sentencebank_core::core_version());

    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let author_id = insert_author(&conn, "smoke-author").expect("author insert");
    let tag_id = insert_tag(&conn, "smoke").expect("tag insert");

    let created = {
        let repo = SqliteSentenceRepository::new(&mut conn);
        let mut service = SentenceService::new(repo);
        service
            .create_sentence(
                &NewSentence {
                    content: "The quick brown fox jumps over the lazy dog.".to_string(),
                    author_id,
                },
                &[tag_id],
            )
            .expect("create should succeed")
    };

    let tally = {
        let repo = SqliteVoteRepository::new(&mut conn);
        let mut ledger = VoteService::new(repo);
        ledger
            .record_vote(created.id, "127.0.0.1", true)
            .expect("first vote should succeed")
    };
    println!(
        "vote tally positive={} negative={}",
        tally.positive_votes, tally.negative_votes
    );

    let repo = SqliteSentenceRepository::new(&mut conn);
    let service = SentenceService::new(repo);
    let random = service.random_sentence().expect("store is non-empty");
    println!(
        "random sentence {}",
        serde_json::to_string(&random).expect("sentence serializes")
    );
}
