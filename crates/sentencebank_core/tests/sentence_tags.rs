use rusqlite::Connection;
use sentencebank_core::db::open_db_in_memory;
use sentencebank_core::{
    insert_author, insert_tag, NewSentence, SentenceRepository, SentenceService,
    SentenceServiceError, SqliteSentenceRepository, TagDelta,
};

struct Fixture {
    conn: Connection,
    sentence_id: i64,
    tag_a: i64,
    tag_b: i64,
    tag_c: i64,
}

fn fixture() -> Fixture {
    let mut conn = open_db_in_memory().unwrap();
    let author_id = insert_author(&conn, "ada").unwrap();
    let tag_a = insert_tag(&conn, "alpha").unwrap();
    let tag_b = insert_tag(&conn, "beta").unwrap();
    let tag_c = insert_tag(&conn, "gamma").unwrap();

    let sentence_id = {
        let mut repo = SqliteSentenceRepository::new(&mut conn);
        repo.create_sentence(
            &NewSentence {
                content: "tag target".to_string(),
                author_id,
            },
            &[],
        )
        .unwrap()
    };

    Fixture {
        conn,
        sentence_id,
        tag_a,
        tag_b,
        tag_c,
    }
}

fn add(ids: &[i64]) -> TagDelta {
    TagDelta {
        add: ids.to_vec(),
        ..TagDelta::default()
    }
}

#[test]
fn adding_the_same_tag_twice_is_idempotent() {
    let mut fx = fixture();
    let repo = SqliteSentenceRepository::new(&mut fx.conn);
    let mut service = SentenceService::new(repo);

    let first = service
        .reconcile_tags(fx.sentence_id, &add(&[fx.tag_a]))
        .unwrap();
    assert_eq!(first.tags, vec![fx.tag_a]);

    let second = service
        .reconcile_tags(fx.sentence_id, &add(&[fx.tag_a]))
        .unwrap();
    assert_eq!(second.tags, vec![fx.tag_a]);
}

#[test]
fn clear_all_takes_precedence_over_adds() {
    let mut fx = fixture();
    let repo = SqliteSentenceRepository::new(&mut fx.conn);
    let mut service = SentenceService::new(repo);

    service
        .reconcile_tags(fx.sentence_id, &add(&[fx.tag_a, fx.tag_b]))
        .unwrap();

    let cleared = service
        .reconcile_tags(
            fx.sentence_id,
            &TagDelta {
                add: vec![fx.tag_c],
                remove: Vec::new(),
                clear_all: true,
            },
        )
        .unwrap();
    assert!(cleared.tags.is_empty());
}

#[test]
fn removal_wins_when_an_id_is_in_both_deltas() {
    let mut fx = fixture();
    let repo = SqliteSentenceRepository::new(&mut fx.conn);
    let mut service = SentenceService::new(repo);

    let result = service
        .reconcile_tags(
            fx.sentence_id,
            &TagDelta {
                add: vec![fx.tag_a],
                remove: vec![fx.tag_a],
                clear_all: false,
            },
        )
        .unwrap();
    assert!(result.tags.is_empty());
}

#[test]
fn detaching_an_absent_tag_is_a_no_op() {
    let mut fx = fixture();
    let repo = SqliteSentenceRepository::new(&mut fx.conn);
    let mut service = SentenceService::new(repo);

    service
        .reconcile_tags(fx.sentence_id, &add(&[fx.tag_a]))
        .unwrap();

    let result = service
        .reconcile_tags(
            fx.sentence_id,
            &TagDelta {
                add: Vec::new(),
                remove: vec![fx.tag_c],
                clear_all: false,
            },
        )
        .unwrap();
    assert_eq!(result.tags, vec![fx.tag_a]);
}

#[test]
fn independent_add_and_remove_deltas_apply_together() {
    let mut fx = fixture();
    let repo = SqliteSentenceRepository::new(&mut fx.conn);
    let mut service = SentenceService::new(repo);

    service
        .reconcile_tags(fx.sentence_id, &add(&[fx.tag_a, fx.tag_b]))
        .unwrap();

    let result = service
        .reconcile_tags(
            fx.sentence_id,
            &TagDelta {
                add: vec![fx.tag_c],
                remove: vec![fx.tag_a],
                clear_all: false,
            },
        )
        .unwrap();
    assert_eq!(result.tags, vec![fx.tag_b, fx.tag_c]);
}

#[test]
fn set_tags_replaces_the_whole_edge_set() {
    let mut fx = fixture();
    let mut repo = SqliteSentenceRepository::new(&mut fx.conn);

    repo.set_tags(fx.sentence_id, &[fx.tag_a, fx.tag_b]).unwrap();
    assert_eq!(repo.tag_ids(fx.sentence_id).unwrap(), vec![fx.tag_a, fx.tag_b]);

    repo.set_tags(fx.sentence_id, &[fx.tag_c]).unwrap();
    assert_eq!(repo.tag_ids(fx.sentence_id).unwrap(), vec![fx.tag_c]);
}

#[test]
fn reconciling_a_missing_sentence_returns_not_found() {
    let mut fx = fixture();
    let repo = SqliteSentenceRepository::new(&mut fx.conn);
    let mut service = SentenceService::new(repo);

    let missing = fx.sentence_id + 100;
    let err = service
        .reconcile_tags(missing, &add(&[fx.tag_a]))
        .unwrap_err();
    match err {
        SentenceServiceError::SentenceNotFound(id) => assert_eq!(id, missing),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn failed_reconcile_applies_nothing() {
    let mut fx = fixture();

    {
        let repo = SqliteSentenceRepository::new(&mut fx.conn);
        let mut service = SentenceService::new(repo);
        service
            .reconcile_tags(fx.sentence_id, &add(&[fx.tag_b]))
            .unwrap();

        // tag id 9999 has no catalog row, so the FK rejects the attach and
        // the whole delta rolls back, tag_a included.
        let delta = TagDelta {
            add: vec![fx.tag_a, 9999],
            remove: vec![fx.tag_b],
            clear_all: false,
        };
        service.reconcile_tags(fx.sentence_id, &delta).unwrap_err();
    }

    let repo = SqliteSentenceRepository::new(&mut fx.conn);
    assert_eq!(repo.tag_ids(fx.sentence_id).unwrap(), vec![fx.tag_b]);
}
