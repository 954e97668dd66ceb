use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Entity, Result, WorkflowError};
use crate::gate::require_verified_email;
use crate::guard::require_owner;
use crate::model::{NewWish, WishId, WishPatch, WishRecord};
use crate::page::Page;
use crate::store::RelationStore;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

fn check_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(WorkflowError::ValidationFailed(format!(
            "name must be between 1 and {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(WorkflowError::ValidationFailed(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Create a wish owned by `actor`. Link and image are expected to be
/// checked by the caller; only lengths are enforced here.
pub fn create_wish<S: RelationStore>(
    store: &S,
    actor: &str,
    wish: NewWish,
    now: DateTime<Utc>,
) -> Result<WishRecord> {
    require_verified_email(store, actor)?;
    check_name(&wish.name)?;
    check_description(&wish.description)?;

    let record = store.transaction(|tx| {
        let record = tx.insert_wish(actor, &wish, now)?;
        Ok::<_, WorkflowError>(record)
    })?;

    info!(owner = actor, wish = record.id, "wish created");
    Ok(record)
}

pub fn read_wish<S: RelationStore>(store: &S, wish_id: WishId) -> Result<WishRecord> {
    store
        .find_wish(wish_id)?
        .ok_or(WorkflowError::NotFound(Entity::Wish))
}

pub fn update_wish<S: RelationStore>(
    store: &S,
    actor: &str,
    wish_id: WishId,
    patch: WishPatch,
) -> Result<WishRecord> {
    let mut wish = read_wish(store, wish_id)?;
    require_owner(&wish, actor)?;
    if let Some(name) = &patch.name {
        check_name(name)?;
    }
    if let Some(description) = &patch.description {
        check_description(description)?;
    }

    patch.apply(&mut wish);
    store.transaction(|tx| {
        tx.update_wish(&wish)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(owner = actor, wish = wish_id, "wish updated");
    Ok(wish)
}

/// Delete a wish and every stage membership that refers to it.
pub fn delete_wish<S: RelationStore>(store: &S, actor: &str, wish_id: WishId) -> Result<WishId> {
    let wish = read_wish(store, wish_id)?;
    require_owner(&wish, actor)?;

    store.transaction(|tx| {
        tx.delete_wish(wish_id)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(owner = actor, wish = wish_id, "wish deleted");
    Ok(wish_id)
}

/// Public listing of `owner`'s wishes, oldest first.
pub fn list_wishes<S: RelationStore>(store: &S, owner: &str, page: Page) -> Result<Vec<WishRecord>> {
    if store.find_user(owner)?.is_none() {
        return Err(WorkflowError::NotFound(Entity::User));
    }
    Ok(store.list_wishes(owner, page.offset(), page.limit())?)
}
