use tracing::info;

use crate::error::{Entity, Result, WorkflowError};
use crate::model::{NewUser, UserPatch, UserRecord};
use crate::store::RelationStore;

pub const MAX_ID_LEN: usize = 64;
pub const MAX_PERSON_NAME_LEN: usize = 64;

/// Ids that collide with static route segments such as `/users/me`.
const RESERVED_IDS: &[&str] = &["me"];

/// Ids are lowercase ASCII letters, digits, `_` and `-`.
pub fn valid_user_id(id: &str) -> bool {
    !id.is_empty()
        && !RESERVED_IDS.contains(&id)
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

fn check_person_name(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v.chars().count() > MAX_PERSON_NAME_LEN => Err(
            WorkflowError::ValidationFailed(format!(
                "{field} must be at most {MAX_PERSON_NAME_LEN} characters"
            )),
        ),
        _ => Ok(()),
    }
}

/// Store a new, unverified user. `password_hash` must already be hashed.
pub fn register<S: RelationStore>(store: &S, user: NewUser) -> Result<UserRecord> {
    if !valid_user_id(&user.id) {
        return Err(WorkflowError::ValidationFailed(
            "id must match ^[a-z0-9_-]+$, be at most 64 characters and not be reserved".into(),
        ));
    }
    check_person_name("first_name", user.first_name.as_deref())?;
    check_person_name("last_name", user.last_name.as_deref())?;

    if store.find_user(&user.id)?.is_some() || store.find_user_by_email(&user.email)?.is_some() {
        return Err(WorkflowError::AlreadyExists(Entity::User));
    }

    store.transaction(|tx| {
        tx.insert_user(&user)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(user = %user.id, "user registered");
    read_user(store, &user.id)
}

pub fn read_user<S: RelationStore>(store: &S, id: &str) -> Result<UserRecord> {
    store
        .find_user(id)?
        .ok_or(WorkflowError::NotFound(Entity::User))
}

/// Replace the actor's display names.
pub fn update_user<S: RelationStore>(store: &S, actor: &str, patch: UserPatch) -> Result<UserRecord> {
    read_user(store, actor)?;
    check_person_name("first_name", patch.first_name.as_deref())?;
    check_person_name("last_name", patch.last_name.as_deref())?;

    store.transaction(|tx| {
        tx.update_user(actor, &patch)?;
        Ok::<_, WorkflowError>(())
    })?;
    read_user(store, actor)
}

/// Remove the actor together with their wishes, code, stage memberships and
/// friend rows.
pub fn delete_user<S: RelationStore>(store: &S, actor: &str) -> Result<String> {
    read_user(store, actor)?;
    store.transaction(|tx| {
        tx.delete_user(actor)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(user = actor, "user deleted");
    Ok(actor.to_string())
}
