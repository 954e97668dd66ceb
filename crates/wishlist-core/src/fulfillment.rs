//! The interest -> claim -> fulfillment lifecycle of one wish.
//!
//! Per (wish, user):
//!
//! ```text
//! Unrelated  --express_interest--> WantToFulfill
//! WantToFulfill --claim----------> Claimers
//! Claimers   --accept_claim-----> Fulfillers   (terminal)
//! Claimers   --reject_claim-----> WantToFulfill
//! ```
//!
//! A user sits in at most one of the three stage sets. Every transition goes
//! through [`move_member`], which adds to the destination and removes from
//! the source inside one transaction.

use tracing::info;

use crate::error::{Entity, Result, WorkflowError};
use crate::gate::require_verified_email;
use crate::guard::{are_friends, is_owner, require_owner};
use crate::model::{Stage, UserRecord, WishId, WishRecord};
use crate::page::Page;
use crate::store::RelationStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct FulfillmentPolicy {
    /// Also refuse interest from users already claiming or fulfilling the
    /// wish. Off by default: re-expressing interest from a later stage is
    /// accepted.
    pub strict_interest: bool,
}

/// Add `actor` to the wish's `WantToFulfill` set.
///
/// The owner and non-friends of the owner get the same `NotAuthorized`.
pub fn express_interest<S: RelationStore>(
    store: &S,
    policy: FulfillmentPolicy,
    actor: &str,
    wish_id: WishId,
) -> Result<WishRecord> {
    require_verified_email(store, actor)?;
    let wish = find_wish(store, wish_id)?;

    if is_owner(&wish, actor) || !are_friends(store, actor, &wish.owner)? {
        return Err(WorkflowError::NotAuthorized);
    }

    if store.count_members(wish_id, Stage::WantToFulfill, actor)? != 0 {
        return Err(WorkflowError::AlreadyExists(Entity::User));
    }
    if policy.strict_interest {
        for stage in [Stage::Claimers, Stage::Fulfillers] {
            if store.count_members(wish_id, stage, actor)? != 0 {
                return Err(WorkflowError::AlreadyExists(Entity::User));
            }
        }
    }

    store.transaction(|tx| {
        if tx.count_members(wish_id, Stage::WantToFulfill, actor)? != 0 {
            return Err(WorkflowError::AlreadyExists(Entity::User));
        }
        tx.add_member(wish_id, Stage::WantToFulfill, actor)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(actor, wish = wish_id, "interest expressed");
    Ok(wish)
}

/// Escalate `actor`'s interest into a claim. Without prior interest the
/// actor is reported missing from the set.
pub fn claim<S: RelationStore>(store: &S, actor: &str, wish_id: WishId) -> Result<WishId> {
    if store.count_members(wish_id, Stage::WantToFulfill, actor)? != 1 {
        return Err(WorkflowError::NotFound(Entity::User));
    }
    move_member(store, wish_id, actor, Stage::WantToFulfill, Stage::Claimers)?;
    Ok(wish_id)
}

/// Owner accepts `claimer`'s claim; the claimer becomes a fulfiller.
pub fn accept_claim<S: RelationStore>(
    store: &S,
    owner: &str,
    wish_id: WishId,
    claimer: &str,
) -> Result<WishRecord> {
    decide_claim(store, owner, wish_id, claimer, Stage::Fulfillers)
}

/// Owner rejects `claimer`'s claim; the claimer goes back to interested.
pub fn reject_claim<S: RelationStore>(
    store: &S,
    owner: &str,
    wish_id: WishId,
    claimer: &str,
) -> Result<WishRecord> {
    decide_claim(store, owner, wish_id, claimer, Stage::WantToFulfill)
}

/// A page of the users in one stage set. Owner only.
pub fn list_stage_members<S: RelationStore>(
    store: &S,
    actor: &str,
    wish_id: WishId,
    stage: Stage,
    page: Page,
) -> Result<Vec<UserRecord>> {
    let wish = find_wish(store, wish_id)?;
    require_owner(&wish, actor)?;
    Ok(store.list_members(wish_id, stage, page.offset(), page.limit())?)
}

/// Move `user` from the `from` set to the `to` set of one wish, atomically.
///
/// Membership in `from` is re-checked inside the transaction; if it is gone
/// the move fails with `NotFound(User)` and nothing is written. A user who
/// already sits in `to` (after re-expressing interest) is only removed from
/// `from`.
pub fn move_member<S: RelationStore>(
    store: &S,
    wish_id: WishId,
    user: &str,
    from: Stage,
    to: Stage,
) -> Result<()> {
    store.transaction(|tx| {
        if tx.count_members(wish_id, from, user)? != 1 {
            return Err(WorkflowError::NotFound(Entity::User));
        }
        if tx.count_members(wish_id, to, user)? == 0 {
            tx.add_member(wish_id, to, user)?;
        }
        tx.remove_member(wish_id, from, user)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(wish = wish_id, user, %from, %to, "stage transition");
    Ok(())
}

fn decide_claim<S: RelationStore>(
    store: &S,
    owner: &str,
    wish_id: WishId,
    claimer: &str,
    to: Stage,
) -> Result<WishRecord> {
    let wish = find_wish(store, wish_id)?;
    require_owner(&wish, owner)?;

    if store.count_members(wish_id, Stage::Claimers, claimer)? != 1 {
        return Err(WorkflowError::NotFound(Entity::User));
    }
    move_member(store, wish_id, claimer, Stage::Claimers, to)?;
    Ok(wish)
}

fn find_wish<S: RelationStore>(store: &S, wish_id: WishId) -> Result<WishRecord> {
    store
        .find_wish(wish_id)?
        .ok_or(WorkflowError::NotFound(Entity::Wish))
}
