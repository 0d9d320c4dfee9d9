use tracing::debug;

use rememerme_db::models::{Game, GameMember, PartyMember, Round};
use rememerme_db::{Database, Identifier, Result};

/// Objects that belong to a game, so access can be checked against its
/// member rows.
pub trait GameScoped {
    fn game_id(&self) -> Option<Identifier>;
}

impl GameScoped for Game {
    fn game_id(&self) -> Option<Identifier> {
        self.game_id
    }
}

impl GameScoped for GameMember {
    fn game_id(&self) -> Option<Identifier> {
        Some(self.game_id)
    }
}

impl GameScoped for Round {
    fn game_id(&self) -> Option<Identifier> {
        Some(self.game_id)
    }
}

/// Object-level permission: only members of the object's game may access it.
pub struct GamePermissions;

impl GamePermissions {
    pub fn has_object_permission<T: GameScoped>(
        db: &Database,
        principal: Identifier,
        obj: &T,
    ) -> Result<bool> {
        match obj.game_id() {
            Some(game_id) => is_member(db, game_id, principal),
            None => Ok(false),
        }
    }
}

/// Whether `principal` has a member row in the game. A missing row reads as
/// "not a member".
pub fn is_member(db: &Database, game_id: Identifier, principal: Identifier) -> Result<bool> {
    let member = match db.filter_by::<GameMember>("game_id", game_id) {
        Ok(members) => members.iter().any(|m| m.user_id == principal),
        Err(e) if e.is_not_found() => false,
        Err(e) => return Err(e),
    };

    debug!("game {} member check for {}: {}", game_id, principal, member);
    Ok(member)
}

/// Same check over a party's member rows.
pub fn is_party_member(db: &Database, party_id: Identifier, principal: Identifier) -> Result<bool> {
    match db.filter_by::<PartyMember>("party_id", party_id) {
        Ok(members) => Ok(members.iter().any(|m| m.user_id == principal)),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
