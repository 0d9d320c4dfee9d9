use rememerme_api::permissions::{is_member, is_party_member};
use rememerme_api::GamePermissions;
use rememerme_db::models::{Game, GameMember, PartyMember, Round};
use rememerme_db::{Database, Identifier};

#[test]
fn members_of_the_game_have_access() {
    let db = Database::open_in_memory().unwrap();
    let player = Identifier::generate();
    let outsider = Identifier::generate();

    let mut game = Game::new(Identifier::generate(), player, 5);
    let game_id = db.save(&mut game).unwrap();
    db.save(&mut GameMember::new(game_id, player)).unwrap();

    let mut round = Round::new(game_id, player, Identifier::generate());
    db.save(&mut round).unwrap();

    assert!(is_member(&db, game_id, player).unwrap());
    assert!(!is_member(&db, game_id, outsider).unwrap());

    assert!(GamePermissions::has_object_permission(&db, player, &round).unwrap());
    assert!(GamePermissions::has_object_permission(&db, player, &game).unwrap());
    assert!(!GamePermissions::has_object_permission(&db, outsider, &round).unwrap());
}

#[test]
fn unknown_game_denies_access() {
    let db = Database::open_in_memory().unwrap();
    assert!(!is_member(&db, Identifier::generate(), Identifier::generate()).unwrap());
}

#[test]
fn unsaved_game_denies_access() {
    let db = Database::open_in_memory().unwrap();
    let leader = Identifier::generate();
    let game = Game::new(Identifier::generate(), leader, 5);
    assert!(!GamePermissions::has_object_permission(&db, leader, &game).unwrap());
}

#[test]
fn party_membership() {
    let db = Database::open_in_memory().unwrap();
    let party = Identifier::generate();
    let user = Identifier::generate();
    db.save(&mut PartyMember::new(party, user)).unwrap();

    assert!(is_party_member(&db, party, user).unwrap());
    assert!(!is_party_member(&db, party, Identifier::generate()).unwrap());
}
