//! Single-use email verification codes.
//!
//! A code is bound to one user, lives for [`CODE_TTL_MINUTES`] and tolerates
//! [`CODE_MAX_RETRIES`] wrong guesses. Only its SHA-256 digest is stored.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Entity, Result, WorkflowError};
use crate::model::CodeRecord;
use crate::store::{RelationStore, StoreTx};

pub const CODE_TTL_MINUTES: i64 = 30;
pub const CODE_MAX_RETRIES: u32 = 3;
const CODE_BYTES: usize = 10;

fn digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

fn expired(code: &CodeRecord, now: DateTime<Utc>) -> bool {
    now > code.created_at + Duration::minutes(CODE_TTL_MINUTES)
}

fn generate() -> String {
    let bytes: [u8; CODE_BYTES] = rand::random();
    STANDARD_NO_PAD.encode(bytes)
}

/// Issue a fresh code for `user_id` and return it in clear. A live code
/// blocks a new one; an expired code is replaced.
pub fn issue_code<S: RelationStore>(store: &S, user_id: &str, now: DateTime<Utc>) -> Result<String> {
    if store.find_user(user_id)?.is_none() {
        return Err(WorkflowError::NotFound(Entity::User));
    }

    let code = generate();
    let record = CodeRecord {
        user_id: user_id.to_string(),
        code_hash: digest(&code),
        retry_count: 0,
        created_at: now,
    };

    store.transaction(|tx| {
        if let Some(existing) = tx.find_code(user_id)? {
            if !expired(&existing, now) {
                return Err(WorkflowError::AlreadyExists(Entity::Code));
            }
            tx.delete_code(user_id)?;
        }
        tx.insert_code(&record)?;
        Ok::<_, WorkflowError>(())
    })?;

    info!(user = user_id, "verification code issued");
    Ok(code)
}

enum Check {
    Matched,
    Mismatched,
    Spent,
}

/// Compare inside `tx`. Bookkeeping (retry bump, deletion of a spent code)
/// is written in every outcome, so the caller must commit before turning a
/// failed check into an error.
fn check(tx: &mut dyn StoreTx, user_id: &str, code: &str, now: DateTime<Utc>) -> Result<Check> {
    let Some(stored) = tx.find_code(user_id)? else {
        return Err(WorkflowError::NotFound(Entity::Code));
    };

    if stored.retry_count >= CODE_MAX_RETRIES || expired(&stored, now) {
        tx.delete_code(user_id)?;
        return Ok(Check::Spent);
    }

    if stored.code_hash != digest(code) {
        tx.set_code_retries(user_id, stored.retry_count + 1)?;
        return Ok(Check::Mismatched);
    }

    tx.delete_code(user_id)?;
    Ok(Check::Matched)
}

fn outcome(user_id: &str, check: Check) -> Result<()> {
    match check {
        Check::Matched => Ok(()),
        Check::Mismatched => {
            debug!(user = user_id, "verification code mismatch");
            Err(WorkflowError::CodeMismatch)
        }
        Check::Spent => {
            debug!(user = user_id, "verification code expired or exhausted");
            Err(WorkflowError::NotFound(Entity::Code))
        }
    }
}

/// Check `code` against the one stored for `user_id`, consuming it on a
/// match.
pub fn verify_code<S: RelationStore>(
    store: &S,
    user_id: &str,
    code: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = store.transaction(|tx| check(tx, user_id, code, now))?;
    outcome(user_id, result)
}

/// Mark `actor`'s email verified. The code is consumed and the flag set in
/// one transaction.
pub fn verify_email<S: RelationStore>(
    store: &S,
    actor: &str,
    code: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let user = store
        .find_user(actor)?
        .ok_or(WorkflowError::NotFound(Entity::User))?;
    if user.email_verified {
        return Err(WorkflowError::AlreadyVerified);
    }

    let result = store.transaction(|tx| {
        let result = check(tx, actor, code, now)?;
        if let Check::Matched = result {
            tx.set_email_verified(actor)?;
        }
        Ok::<_, WorkflowError>(result)
    })?;
    outcome(actor, result)?;

    info!(user = actor, "email verified");
    Ok(())
}
