//! Friend requests and the friendships they turn into.
//!
//! Per ordered pair (requester, requestee):
//! `NoRelation -> Requested -> Friends`, with reject and withdraw returning
//! to `NoRelation`.

use tracing::info;

use crate::error::{Entity, Result, WorkflowError};
use crate::gate::require_verified_email;
use crate::guard::{is_self, require_self};
use crate::model::UserRecord;
use crate::page::Page;
use crate::store::{RelationStore, StoreTx};

/// An undirected friendship. Persisted as two directed rows that are only
/// ever written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Friendship {
    a: String,
    b: String,
}

impl Friendship {
    pub fn new(x: &str, y: &str) -> Self {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        Self {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    /// Both directed rows, `a -> b` then `b -> a`.
    pub fn rows(&self) -> [(&str, &str); 2] {
        [
            (self.a.as_str(), self.b.as_str()),
            (self.b.as_str(), self.a.as_str()),
        ]
    }

    pub fn exists<S: RelationStore>(&self, store: &S) -> Result<bool> {
        for (user, friend) in self.rows() {
            if store.count_friendships(user, friend)? != 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn establish(&self, tx: &mut dyn StoreTx) -> Result<()> {
        for (user, friend) in self.rows() {
            tx.add_friendship(user, friend)?;
        }
        Ok(())
    }
}

/// Ask `requestee_id` to become friends with `requester`.
///
/// Targeting oneself is reported as a missing user. A pending request in
/// either direction or an existing friendship is `AlreadyExists`.
pub fn send_request<S: RelationStore>(
    store: &S,
    requester: &str,
    requestee_id: &str,
) -> Result<UserRecord> {
    require_verified_email(store, requester)?;

    if is_self(requestee_id, requester) {
        return Err(WorkflowError::NotFound(Entity::User));
    }

    let requestee = store
        .find_user(requestee_id)?
        .ok_or(WorkflowError::NotFound(Entity::User))?;

    if store.count_friend_requests(requestee_id, requester)? != 0
        || store.count_friend_requests(requester, requestee_id)? != 0
        || Friendship::new(requester, requestee_id).exists(store)?
    {
        return Err(WorkflowError::AlreadyExists(Entity::FriendRequest));
    }

    store.transaction(|tx| {
        ensure_unrelated(tx, requester, requestee_id)?;
        tx.add_friend_request(requestee_id, requester)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(requester, requestee = requestee_id, "friend request sent");
    Ok(requestee)
}

/// Take back a request `requester` sent to `requestee_id`.
pub fn withdraw_request<S: RelationStore>(
    store: &S,
    requester: &str,
    requestee_id: &str,
) -> Result<UserRecord> {
    if store.count_friend_requests(requestee_id, requester)? != 1 {
        return Err(WorkflowError::NotFound(Entity::FriendRequest));
    }
    let requestee = store
        .find_user(requestee_id)?
        .ok_or(WorkflowError::NotFound(Entity::User))?;

    store.transaction(|tx| {
        ensure_pending(tx, requestee_id, requester)?;
        tx.remove_friend_request(requestee_id, requester)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(requester, requestee = requestee_id, "friend request withdrawn");
    Ok(requestee)
}

/// Accept the pending request from `requester_id`. Both friendship rows are
/// added and the request removed in one transaction.
pub fn accept_request<S: RelationStore>(
    store: &S,
    accepter: &str,
    requester_id: &str,
) -> Result<UserRecord> {
    require_verified_email(store, accepter)?;
    let requester = pending_requester(store, accepter, requester_id)?;

    store.transaction(|tx| {
        ensure_pending(tx, accepter, requester_id)?;
        Friendship::new(accepter, requester_id).establish(tx)?;
        tx.remove_friend_request(accepter, requester_id)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(accepter, requester = requester_id, "friend request accepted");
    Ok(requester)
}

/// Drop the pending request from `requester_id` without befriending.
pub fn reject_request<S: RelationStore>(
    store: &S,
    rejecter: &str,
    requester_id: &str,
) -> Result<UserRecord> {
    require_verified_email(store, rejecter)?;
    let requester = pending_requester(store, rejecter, requester_id)?;

    store.transaction(|tx| {
        ensure_pending(tx, rejecter, requester_id)?;
        tx.remove_friend_request(rejecter, requester_id)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(rejecter, requester = requester_id, "friend request rejected");
    Ok(requester)
}

/// A page of `user`'s friends. Only `user` may list them.
pub fn list_friends<S: RelationStore>(
    store: &S,
    actor: &str,
    user: &str,
    page: Page,
) -> Result<Vec<UserRecord>> {
    require_verified_email(store, actor)?;
    require_self(user, actor)?;
    Ok(store.list_friends(user, page.offset(), page.limit())?)
}

/// A page of users waiting on `user` to answer their request.
pub fn list_friend_requests<S: RelationStore>(
    store: &S,
    actor: &str,
    user: &str,
    page: Page,
) -> Result<Vec<UserRecord>> {
    require_verified_email(store, actor)?;
    require_self(user, actor)?;
    Ok(store.list_friend_requests(user, page.offset(), page.limit())?)
}

fn pending_requester<S: RelationStore>(
    store: &S,
    requestee: &str,
    requester_id: &str,
) -> Result<UserRecord> {
    if store.count_friend_requests(requestee, requester_id)? != 1 {
        return Err(WorkflowError::NotFound(Entity::FriendRequest));
    }
    store
        .find_user(requester_id)?
        .ok_or(WorkflowError::NotFound(Entity::User))
}

/// No pending request either way and no friendship row in either direction.
fn ensure_unrelated(tx: &dyn StoreTx, requester: &str, requestee: &str) -> Result<()> {
    let pair = Friendship::new(requester, requestee);
    let mut rows = tx.count_friend_requests(requestee, requester)?
        + tx.count_friend_requests(requester, requestee)?;
    for (user, friend) in pair.rows() {
        rows += tx.count_friendships(user, friend)?;
    }
    if rows != 0 {
        return Err(WorkflowError::AlreadyExists(Entity::FriendRequest));
    }
    Ok(())
}

fn ensure_pending(tx: &dyn StoreTx, requestee: &str, requester: &str) -> Result<()> {
    if tx.count_friend_requests(requestee, requester)? != 1 {
        return Err(WorkflowError::NotFound(Entity::FriendRequest));
    }
    Ok(())
}
