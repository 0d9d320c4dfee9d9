//! Entity kinds persisted through the store.
//!
//! Each kind is a plain struct plus a static [`Schema`]; the store itself is
//! the same for all of them.

use chrono::{DateTime, Utc};

use crate::codec::Codec;
use crate::error::Result;
use crate::identifier::Identifier;
use crate::schema::{Entity, FieldSpec, Schema};
use crate::value::Record;

/// Every schema, in bootstrap order.
pub static ALL_SCHEMAS: &[&Schema] = &[
    &FRIENDS_SCHEMA,
    &RECEIVED_REQUESTS_SCHEMA,
    &SENT_REQUESTS_SCHEMA,
    &GAME_SCHEMA,
    &PARTY_SCHEMA,
    &PARTY_MEMBER_SCHEMA,
    &GAME_MEMBER_SCHEMA,
    &ROUND_SCHEMA,
    &NOMINATION_SCHEMA,
];

/// Look up a schema by its table name.
pub fn schema_for_table(table: &str) -> Option<&'static Schema> {
    ALL_SCHEMAS.iter().copied().find(|s| s.table == table)
}

const DATE_CREATED: FieldSpec = FieldSpec::new("date_created", Codec::TIMESTAMP);
const LAST_MODIFIED: FieldSpec = FieldSpec::new("last_modified", Codec::TIMESTAMP);

// -- Friends --

pub static FRIENDS_SCHEMA: Schema = Schema {
    kind: "Friends",
    table: "friends",
    id_field: "user_id",
    fields: &[FieldSpec::new("friends_list", Codec::JSON_ID_LIST)],
};

/// A user's friends list, keyed by the user's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Friends {
    pub user_id: Option<Identifier>,
    pub friends_list: Vec<Identifier>,
}

impl Entity for Friends {
    const SCHEMA: &'static Schema = &FRIENDS_SCHEMA;

    fn id(&self) -> Option<Identifier> {
        self.user_id
    }

    fn set_id(&mut self, id: Identifier) {
        self.user_id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new(self.user_id).with("friends_list", self.friends_list.clone())
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            user_id: record.id,
            friends_list: record.take(Self::SCHEMA, "friends_list")?,
        })
    }
}

// -- Friend requests --

pub static RECEIVED_REQUESTS_SCHEMA: Schema = Schema {
    kind: "ReceivedRequests",
    table: "received_requests",
    id_field: "user_id",
    fields: &[FieldSpec::new("requests", Codec::JSON_ID_LIST)],
};

pub static SENT_REQUESTS_SCHEMA: Schema = Schema {
    kind: "SentRequests",
    table: "sent_requests",
    id_field: "user_id",
    fields: &[FieldSpec::new("requests", Codec::JSON_ID_LIST)],
};

/// Pending friend requests a user has received, by sender id.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedRequests {
    pub user_id: Option<Identifier>,
    pub requests: Vec<Identifier>,
}

/// Pending friend requests a user has sent, by recipient id.
#[derive(Debug, Clone, PartialEq)]
pub struct SentRequests {
    pub user_id: Option<Identifier>,
    pub requests: Vec<Identifier>,
}

macro_rules! request_entity {
    ($ty:ident, $schema:ident) => {
        impl Entity for $ty {
            const SCHEMA: &'static Schema = &$schema;

            fn id(&self) -> Option<Identifier> {
                self.user_id
            }

            fn set_id(&mut self, id: Identifier) {
                self.user_id = Some(id);
            }

            fn to_record(&self) -> Record {
                Record::new(self.user_id).with("requests", self.requests.clone())
            }

            fn from_record(mut record: Record) -> Result<Self> {
                Ok(Self {
                    user_id: record.id,
                    requests: record.take(Self::SCHEMA, "requests")?,
                })
            }
        }
    };
}

request_entity!(ReceivedRequests, RECEIVED_REQUESTS_SCHEMA);
request_entity!(SentRequests, SENT_REQUESTS_SCHEMA);

// -- Game --

pub static GAME_SCHEMA: Schema = Schema {
    kind: "Game",
    table: "games",
    id_field: "game_id",
    fields: &[
        FieldSpec::new("party_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("leader_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("current_round_id", Codec::IDENTIFIER),
        FieldSpec::new("winning_score", Codec::INTEGER),
        FieldSpec::new("started", Codec::BOOLEAN),
        DATE_CREATED,
        LAST_MODIFIED,
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub game_id: Option<Identifier>,
    pub party_id: Identifier,
    pub leader_id: Identifier,
    pub current_round_id: Option<Identifier>,
    pub winning_score: i64,
    pub started: bool,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Game {
    pub fn new(party_id: Identifier, leader_id: Identifier, winning_score: i64) -> Self {
        let now = Utc::now();
        Self {
            game_id: None,
            party_id,
            leader_id,
            current_round_id: None,
            winning_score,
            started: false,
            date_created: now,
            last_modified: now,
        }
    }
}

impl Entity for Game {
    const SCHEMA: &'static Schema = &GAME_SCHEMA;

    fn id(&self) -> Option<Identifier> {
        self.game_id
    }

    fn set_id(&mut self, id: Identifier) {
        self.game_id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new(self.game_id)
            .with("party_id", self.party_id)
            .with("leader_id", self.leader_id)
            .with("current_round_id", self.current_round_id)
            .with("winning_score", self.winning_score)
            .with("started", self.started)
            .with("date_created", self.date_created)
            .with("last_modified", self.last_modified)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        let s = Self::SCHEMA;
        Ok(Self {
            game_id: record.id,
            party_id: record.take(s, "party_id")?,
            leader_id: record.take(s, "leader_id")?,
            current_round_id: record.take(s, "current_round_id")?,
            winning_score: record.take(s, "winning_score")?,
            started: record.take(s, "started")?,
            date_created: record.take(s, "date_created")?,
            last_modified: record.take(s, "last_modified")?,
        })
    }
}

// -- Party --

pub static PARTY_SCHEMA: Schema = Schema {
    kind: "Party",
    table: "parties",
    id_field: "party_id",
    fields: &[
        FieldSpec::new("leader_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("game_id", Codec::IDENTIFIER),
        DATE_CREATED,
        LAST_MODIFIED,
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub party_id: Option<Identifier>,
    pub leader_id: Identifier,
    /// Game currently being played by this party, if any.
    pub game_id: Option<Identifier>,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Party {
    pub fn new(leader_id: Identifier) -> Self {
        let now = Utc::now();
        Self {
            party_id: None,
            leader_id,
            game_id: None,
            date_created: now,
            last_modified: now,
        }
    }
}

impl Entity for Party {
    const SCHEMA: &'static Schema = &PARTY_SCHEMA;

    fn id(&self) -> Option<Identifier> {
        self.party_id
    }

    fn set_id(&mut self, id: Identifier) {
        self.party_id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new(self.party_id)
            .with("leader_id", self.leader_id)
            .with("game_id", self.game_id)
            .with("date_created", self.date_created)
            .with("last_modified", self.last_modified)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        let s = Self::SCHEMA;
        Ok(Self {
            party_id: record.id,
            leader_id: record.take(s, "leader_id")?,
            game_id: record.take(s, "game_id")?,
            date_created: record.take(s, "date_created")?,
            last_modified: record.take(s, "last_modified")?,
        })
    }
}

// -- Members --

pub static PARTY_MEMBER_SCHEMA: Schema = Schema {
    kind: "PartyMember",
    table: "party_members",
    id_field: "party_member_id",
    fields: &[
        FieldSpec::new("user_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("party_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("status", Codec::INTEGER),
        DATE_CREATED,
        LAST_MODIFIED,
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct PartyMember {
    pub party_member_id: Option<Identifier>,
    pub user_id: Identifier,
    pub party_id: Identifier,
    pub status: i64,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl PartyMember {
    pub fn new(party_id: Identifier, user_id: Identifier) -> Self {
        let now = Utc::now();
        Self {
            party_member_id: None,
            user_id,
            party_id,
            status: 0,
            date_created: now,
            last_modified: now,
        }
    }
}

impl Entity for PartyMember {
    const SCHEMA: &'static Schema = &PARTY_MEMBER_SCHEMA;

    fn id(&self) -> Option<Identifier> {
        self.party_member_id
    }

    fn set_id(&mut self, id: Identifier) {
        self.party_member_id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new(self.party_member_id)
            .with("user_id", self.user_id)
            .with("party_id", self.party_id)
            .with("status", self.status)
            .with("date_created", self.date_created)
            .with("last_modified", self.last_modified)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        let s = Self::SCHEMA;
        Ok(Self {
            party_member_id: record.id,
            user_id: record.take(s, "user_id")?,
            party_id: record.take(s, "party_id")?,
            status: record.take(s, "status")?,
            date_created: record.take(s, "date_created")?,
            last_modified: record.take(s, "last_modified")?,
        })
    }
}

pub static GAME_MEMBER_SCHEMA: Schema = Schema {
    kind: "GameMember",
    table: "game_members",
    id_field: "game_member_id",
    fields: &[
        FieldSpec::new("user_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("game_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("status", Codec::INTEGER),
        DATE_CREATED,
        LAST_MODIFIED,
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct GameMember {
    pub game_member_id: Option<Identifier>,
    pub user_id: Identifier,
    pub game_id: Identifier,
    pub status: i64,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl GameMember {
    pub fn new(game_id: Identifier, user_id: Identifier) -> Self {
        let now = Utc::now();
        Self {
            game_member_id: None,
            user_id,
            game_id,
            status: 0,
            date_created: now,
            last_modified: now,
        }
    }
}

impl Entity for GameMember {
    const SCHEMA: &'static Schema = &GAME_MEMBER_SCHEMA;

    fn id(&self) -> Option<Identifier> {
        self.game_member_id
    }

    fn set_id(&mut self, id: Identifier) {
        self.game_member_id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new(self.game_member_id)
            .with("user_id", self.user_id)
            .with("game_id", self.game_id)
            .with("status", self.status)
            .with("date_created", self.date_created)
            .with("last_modified", self.last_modified)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        let s = Self::SCHEMA;
        Ok(Self {
            game_member_id: record.id,
            user_id: record.take(s, "user_id")?,
            game_id: record.take(s, "game_id")?,
            status: record.take(s, "status")?,
            date_created: record.take(s, "date_created")?,
            last_modified: record.take(s, "last_modified")?,
        })
    }
}

// -- Rounds --

pub static ROUND_SCHEMA: Schema = Schema {
    kind: "Round",
    table: "rounds",
    id_field: "round_id",
    fields: &[
        FieldSpec::new("selector_id", Codec::IDENTIFIER),
        FieldSpec::new("selection_id", Codec::IDENTIFIER),
        FieldSpec::new("phrase_card_id", Codec::IDENTIFIER),
        FieldSpec::new("game_id", Codec::IDENTIFIER).indexed(),
        DATE_CREATED,
        LAST_MODIFIED,
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub round_id: Option<Identifier>,
    /// Player picking the winning nomination this round.
    pub selector_id: Identifier,
    /// Winning nomination, once picked.
    pub selection_id: Option<Identifier>,
    pub phrase_card_id: Identifier,
    pub game_id: Identifier,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Round {
    pub fn new(game_id: Identifier, selector_id: Identifier, phrase_card_id: Identifier) -> Self {
        let now = Utc::now();
        Self {
            round_id: None,
            selector_id,
            selection_id: None,
            phrase_card_id,
            game_id,
            date_created: now,
            last_modified: now,
        }
    }
}

impl Entity for Round {
    const SCHEMA: &'static Schema = &ROUND_SCHEMA;

    fn id(&self) -> Option<Identifier> {
        self.round_id
    }

    fn set_id(&mut self, id: Identifier) {
        self.round_id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new(self.round_id)
            .with("selector_id", self.selector_id)
            .with("selection_id", self.selection_id)
            .with("phrase_card_id", self.phrase_card_id)
            .with("game_id", self.game_id)
            .with("date_created", self.date_created)
            .with("last_modified", self.last_modified)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        let s = Self::SCHEMA;
        Ok(Self {
            round_id: record.id,
            selector_id: record.take(s, "selector_id")?,
            selection_id: record.take(s, "selection_id")?,
            phrase_card_id: record.take(s, "phrase_card_id")?,
            game_id: record.take(s, "game_id")?,
            date_created: record.take(s, "date_created")?,
            last_modified: record.take(s, "last_modified")?,
        })
    }
}

pub static NOMINATION_SCHEMA: Schema = Schema {
    kind: "Nomination",
    table: "nominations",
    id_field: "nomination_id",
    fields: &[
        FieldSpec::new("round_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("nominator_id", Codec::IDENTIFIER).indexed(),
        FieldSpec::new("nomination_card_id", Codec::IDENTIFIER),
        DATE_CREATED,
        LAST_MODIFIED,
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Nomination {
    pub nomination_id: Option<Identifier>,
    pub round_id: Identifier,
    pub nominator_id: Identifier,
    pub nomination_card_id: Identifier,
    pub date_created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Nomination {
    pub fn new(round_id: Identifier, nominator_id: Identifier, nomination_card_id: Identifier) -> Self {
        let now = Utc::now();
        Self {
            nomination_id: None,
            round_id,
            nominator_id,
            nomination_card_id,
            date_created: now,
            last_modified: now,
        }
    }
}

impl Entity for Nomination {
    const SCHEMA: &'static Schema = &NOMINATION_SCHEMA;

    fn id(&self) -> Option<Identifier> {
        self.nomination_id
    }

    fn set_id(&mut self, id: Identifier) {
        self.nomination_id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new(self.nomination_id)
            .with("round_id", self.round_id)
            .with("nominator_id", self.nominator_id)
            .with("nomination_card_id", self.nomination_card_id)
            .with("date_created", self.date_created)
            .with("last_modified", self.last_modified)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        let s = Self::SCHEMA;
        Ok(Self {
            nomination_id: record.id,
            round_id: record.take(s, "round_id")?,
            nominator_id: record.take(s, "nominator_id")?,
            nomination_card_id: record.take(s, "nomination_card_id")?,
            date_created: record.take(s, "date_created")?,
            last_modified: record.take(s, "last_modified")?,
        })
    }
}
