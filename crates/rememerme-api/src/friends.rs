//! Friends lists and friend requests.
//!
//! Each user has up to three rows keyed by their id: `Friends`,
//! `SentRequests` and `ReceivedRequests`. A missing row behaves as an empty
//! list. Operations touch several rows one after another, with no
//! cross-row atomicity.

use thiserror::Error;
use tracing::info;

use rememerme_db::models::{Friends, ReceivedRequests, SentRequests};
use rememerme_db::{Database, Identifier, StoreError};

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("Cannot send a friend request to yourself")]
    SelfRequest,

    #[error("{0} and {1} are already friends")]
    AlreadyFriends(Identifier, Identifier),

    #[error("Friend request from {from} to {to} is already pending")]
    AlreadyRequested { from: Identifier, to: Identifier },

    #[error("No pending friend request from {from} to {to}")]
    NoSuchRequest { from: Identifier, to: Identifier },

    #[error("{0} and {1} are not friends")]
    NotFriends(Identifier, Identifier),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SocialError>;

pub fn friends_of(db: &Database, user: Identifier) -> Result<Vec<Identifier>> {
    Ok(load_friends(db, user)?.friends_list)
}

pub fn pending_received(db: &Database, user: Identifier) -> Result<Vec<Identifier>> {
    Ok(load_received(db, user)?.requests)
}

pub fn pending_sent(db: &Database, user: Identifier) -> Result<Vec<Identifier>> {
    Ok(load_sent(db, user)?.requests)
}

/// Sends a request from `from` to `to`. If `to` has already asked `from`,
/// the two become friends straight away.
pub fn send_request(db: &Database, from: Identifier, to: Identifier) -> Result<()> {
    if from == to {
        return Err(SocialError::SelfRequest);
    }

    if load_friends(db, from)?.friends_list.contains(&to) {
        return Err(SocialError::AlreadyFriends(from, to));
    }

    // A pending request the other way round is accepted instead.
    if load_received(db, from)?.requests.contains(&to) {
        return accept_request(db, from, to);
    }

    let mut sent = load_sent(db, from)?;
    if sent.requests.contains(&to) {
        return Err(SocialError::AlreadyRequested { from, to });
    }
    sent.requests.push(to);

    let mut received = load_received(db, to)?;
    push_unique(&mut received.requests, from);

    db.save(&mut sent)?;
    db.save(&mut received)?;

    info!("Friend request sent: {} -> {}", from, to);
    Ok(())
}

/// `user` accepts the pending request that `from` sent them.
pub fn accept_request(db: &Database, user: Identifier, from: Identifier) -> Result<()> {
    let mut received = load_received(db, user)?;
    if !remove(&mut received.requests, from) {
        return Err(SocialError::NoSuchRequest { from, to: user });
    }

    let mut sent = load_sent(db, from)?;
    remove(&mut sent.requests, user);

    let mut mine = load_friends(db, user)?;
    push_unique(&mut mine.friends_list, from);
    let mut theirs = load_friends(db, from)?;
    push_unique(&mut theirs.friends_list, user);

    db.save(&mut received)?;
    db.save(&mut sent)?;
    db.save(&mut mine)?;
    db.save(&mut theirs)?;

    info!("Friend request accepted: {} -> {}", from, user);
    Ok(())
}

/// `user` declines the pending request that `from` sent them.
pub fn deny_request(db: &Database, user: Identifier, from: Identifier) -> Result<()> {
    let mut received = load_received(db, user)?;
    if !remove(&mut received.requests, from) {
        return Err(SocialError::NoSuchRequest { from, to: user });
    }

    let mut sent = load_sent(db, from)?;
    remove(&mut sent.requests, user);

    db.save(&mut received)?;
    db.save(&mut sent)?;

    info!("Friend request denied: {} -> {}", from, user);
    Ok(())
}

pub fn remove_friend(db: &Database, user: Identifier, friend: Identifier) -> Result<()> {
    let mut mine = load_friends(db, user)?;
    if !remove(&mut mine.friends_list, friend) {
        return Err(SocialError::NotFriends(user, friend));
    }

    let mut theirs = load_friends(db, friend)?;
    remove(&mut theirs.friends_list, user);

    db.save(&mut mine)?;
    db.save(&mut theirs)?;

    info!("Friendship removed: {} <-> {}", user, friend);
    Ok(())
}

fn load_friends(db: &Database, user: Identifier) -> std::result::Result<Friends, StoreError> {
    Ok(db.try_get_by_id(user)?.unwrap_or(Friends {
        user_id: Some(user),
        friends_list: Vec::new(),
    }))
}

fn load_sent(db: &Database, user: Identifier) -> std::result::Result<SentRequests, StoreError> {
    Ok(db.try_get_by_id(user)?.unwrap_or(SentRequests {
        user_id: Some(user),
        requests: Vec::new(),
    }))
}

fn load_received(
    db: &Database,
    user: Identifier,
) -> std::result::Result<ReceivedRequests, StoreError> {
    Ok(db.try_get_by_id(user)?.unwrap_or(ReceivedRequests {
        user_id: Some(user),
        requests: Vec::new(),
    }))
}

fn push_unique(list: &mut Vec<Identifier>, id: Identifier) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Returns whether `id` was present.
fn remove(list: &mut Vec<Identifier>, id: Identifier) -> bool {
    let before = list.len();
    list.retain(|x| *x != id);
    list.len() != before
}
