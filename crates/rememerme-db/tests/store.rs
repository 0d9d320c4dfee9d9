use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use rememerme_db::models::{Friends, Game, GameMember, Party, PartyMember, Round};
use rememerme_db::{Database, Entity, FieldValue, Identifier, Record, StoreConfig, StoreError};

fn write_raw_cell(db: &Database, table: &str, row_key: &str, field: &str, value: &str) {
    db.with_conn_mut(|conn| {
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (row_key, field_name, field_value) VALUES (?1, ?2, ?3)",
                table
            ),
            (row_key, field, value),
        )?;
        Ok(())
    })
    .unwrap();
}

#[test]
fn file_backed_store_reads_through_pool() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("rememerme.db"),
        reader_pool_size: 2,
    };
    let db = Database::open(&config).unwrap();

    let leader = Identifier::generate();
    let mut party = Party::new(leader);
    let party_id = db.save(&mut party).unwrap();

    let mut members = Vec::new();
    for _ in 0..3 {
        let mut member = PartyMember::new(party_id, Identifier::generate());
        db.save(&mut member).unwrap();
        members.push(member);
    }

    // Several reads so every pooled reader is used at least once.
    for _ in 0..4 {
        assert_eq!(db.get_by_id::<Party>(party_id).unwrap(), party);
        let found: Vec<PartyMember> = db.filter_by("party_id", party_id).unwrap();
        assert_eq!(found.len(), 3);
    }

    let led: Vec<Party> = db.filter_by("leader_id", leader).unwrap();
    assert_eq!(led, vec![party]);
}

#[test]
fn reopening_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rememerme.db");

    let user = Identifier::generate();
    let friend = Identifier::generate();
    {
        let db = Database::open_path(&path, 1).unwrap();
        let mut friends = Friends {
            user_id: Some(user),
            friends_list: vec![friend],
        };
        db.save(&mut friends).unwrap();
    }

    let db = Database::open_path(&path, 1).unwrap();
    let friends: Friends = db.get_by_id(user).unwrap();
    assert_eq!(friends.friends_list, vec![friend]);
}

#[test]
fn malformed_json_field_is_reported() {
    let db = Database::open_in_memory().unwrap();
    let user = Identifier::generate();
    write_raw_cell(&db, "friends", &user.to_string(), "friends_list", "[\"abc\", ");

    match db.get_by_id::<Friends>(user) {
        Err(StoreError::MalformedField { kind, field, .. }) => {
            assert_eq!(kind, "Friends");
            assert_eq!(field, "friends_list");
        }
        other => panic!("expected MalformedField, got {:?}", other),
    }
}

#[test]
fn malformed_round_field_is_reported() {
    let db = Database::open_in_memory().unwrap();
    let mut round = Round::new(
        Identifier::generate(),
        Identifier::generate(),
        Identifier::generate(),
    );
    let id = db.save(&mut round).unwrap();

    write_raw_cell(&db, "rounds", &id.to_string(), "selector_id", "{not an id}");

    let err = db.get_by_id::<Round>(id).unwrap_err();
    assert!(matches!(err, StoreError::MalformedField { .. }), "{:?}", err);

    // The rest of the row is still readable at the record level.
    let cells = db.with_conn(|conn| {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM rounds WHERE row_key = ?1",
            [id.to_string()],
            |r| r.get::<_, i64>(0),
        )?)
    });
    assert_eq!(cells.unwrap(), 6);
}

#[test]
fn generated_ids_are_distinct() {
    let db = Database::open_in_memory().unwrap();
    let mut seen = HashSet::new();

    for _ in 0..50 {
        let saved = db
            .save_record(
                GameMember::SCHEMA,
                Record::new(None).with("status", 1i64),
            )
            .unwrap();
        let id = saved.id.unwrap();
        assert!(!id.to_string().is_empty());
        assert_eq!(Identifier::parse(&id.to_string()).unwrap(), id);
        assert!(seen.insert(id));
    }
}

#[test]
fn undeclared_filter_fails_on_empty_and_populated_tables() {
    let db = Database::open_in_memory().unwrap();
    let value = FieldValue::Integer(0);

    assert!(matches!(
        db.filter_records(GameMember::SCHEMA, "status", &value),
        Err(StoreError::UnsupportedFilter { .. })
    ));

    let mut member = GameMember::new(Identifier::generate(), Identifier::generate());
    db.save(&mut member).unwrap();

    assert!(matches!(
        db.filter_records(GameMember::SCHEMA, "status", &value),
        Err(StoreError::UnsupportedFilter { .. })
    ));
}

#[test]
fn concurrent_saves_are_last_write_wins() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let mut game = Game::new(Identifier::generate(), Identifier::generate(), 3);
    let id = db.save(&mut game).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|score| {
            let db = Arc::clone(&db);
            let mut game = game.clone();
            thread::spawn(move || {
                game.winning_score = score;
                db.save(&mut game).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored: Game = db.get_by_id(id).unwrap();
    assert!((0..8).contains(&stored.winning_score));
    assert_eq!(stored.leader_id, game.leader_id);
}

#[test]
fn game_member_scenario() {
    let db = Database::open_in_memory().unwrap();
    let game = Identifier::generate();
    let user = Identifier::generate();

    let mut member = GameMember::new(game, user);
    member.status = 0;
    db.save(&mut member).unwrap();

    let found: Vec<GameMember> = db.filter_by("game_id", game).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user_id, user);
    assert_eq!(found[0], member);
}

#[test]
fn out_of_range_timestamp_is_rejected_before_writing() {
    use chrono::{TimeZone, Utc};

    let db = Database::open_in_memory().unwrap();
    let id = Identifier::generate();
    let mut game = Game::new(Identifier::generate(), Identifier::generate(), 5);
    game.game_id = Some(id);
    game.last_modified = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();

    match db.save(&mut game) {
        Err(StoreError::MalformedField { field, .. }) => assert_eq!(field, "last_modified"),
        other => panic!("expected MalformedField, got {:?}", other),
    }

    let err = db.get_by_id::<Game>(id).unwrap_err();
    assert!(err.is_not_found(), "{:?}", err);
}

#[test]
fn missing_table_is_store_unavailable() {
    let db = Database::open_in_memory().unwrap();
    let mut game = Game::new(Identifier::generate(), Identifier::generate(), 5);
    let id = db.save(&mut game).unwrap();

    db.with_conn_mut(|conn| {
        conn.execute_batch("DROP TABLE games")?;
        Ok(())
    })
    .unwrap();

    assert!(matches!(
        db.get_by_id::<Game>(id),
        Err(StoreError::StoreUnavailable(_))
    ));
    assert!(matches!(
        db.save(&mut game),
        Err(StoreError::StoreUnavailable(_))
    ));
}

#[test]
fn poisoned_writer_is_store_unavailable() {
    let db = Arc::new(Database::open_in_memory().unwrap());

    let poisoner = Arc::clone(&db);
    let joined = thread::spawn(move || {
        let _ = poisoner.with_conn_mut(|_| -> rememerme_db::Result<()> {
            panic!("writer panicked while holding the lock")
        });
    })
    .join();
    assert!(joined.is_err());

    match db.get_by_id::<Game>(Identifier::generate()) {
        Err(StoreError::StoreUnavailable(reason)) => assert!(reason.contains("poisoned")),
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }
    let mut member = GameMember::new(Identifier::generate(), Identifier::generate());
    assert!(matches!(
        db.save(&mut member),
        Err(StoreError::StoreUnavailable(_))
    ));
}
