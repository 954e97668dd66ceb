//! Email-verification precondition, composed in front of the operations
//! that require a verified address.

use tracing::debug;

use crate::error::{Result, WorkflowError};
use crate::model::UserRecord;
use crate::store::RelationStore;

/// Refuse with `NotAuthorized` unless `actor` exists and has verified their
/// email. A missing actor is refused the same way.
pub fn require_verified_email<S: RelationStore>(store: &S, actor: &str) -> Result<UserRecord> {
    match store.find_user(actor)? {
        Some(user) if user.email_verified => Ok(user),
        _ => {
            debug!(actor, "refused: email not verified");
            Err(WorkflowError::NotAuthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn verified_user_passes() {
        let store = MemoryStore::new();
        store.seed_user("alice", true);
        assert_eq!(require_verified_email(&store, "alice").unwrap().id, "alice");
    }

    #[test]
    fn unverified_or_missing_user_is_refused() {
        let store = MemoryStore::new();
        store.seed_user("bob", false);
        assert!(matches!(
            require_verified_email(&store, "bob"),
            Err(WorkflowError::NotAuthorized)
        ));
        assert!(matches!(
            require_verified_email(&store, "ghost"),
            Err(WorkflowError::NotAuthorized)
        ));
    }
}
