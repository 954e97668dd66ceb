//! Authorization predicates. Callers resolve `NotFound` before asking these,
//! so a refusal never reveals whether the target exists.

use crate::error::{Result, WorkflowError};
use crate::model::WishRecord;
use crate::store::RelationStore;

pub fn is_owner(wish: &WishRecord, actor: &str) -> bool {
    wish.owner == actor
}

pub fn is_self(target: &str, actor: &str) -> bool {
    target == actor
}

/// True iff exactly one friendship row `a -> b` exists. Rows are written in
/// pairs, so one direction is enough.
pub fn are_friends<S: RelationStore>(store: &S, a: &str, b: &str) -> Result<bool> {
    Ok(store.count_friendships(a, b)? == 1)
}

pub fn require_owner(wish: &WishRecord, actor: &str) -> Result<()> {
    if is_owner(wish, actor) {
        Ok(())
    } else {
        Err(WorkflowError::NotAuthorized)
    }
}

pub fn require_self(target: &str, actor: &str) -> Result<()> {
    if is_self(target, actor) {
        Ok(())
    } else {
        Err(WorkflowError::NotAuthorized)
    }
}
