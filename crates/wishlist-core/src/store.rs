//! The relationship store contract the workflows are written against.
//!
//! Reads go through [`RelationStore`]; every mutation goes through a
//! [`StoreTx`] handed out by [`RelationStore::transaction`], so paired
//! association changes commit together or not at all.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::model::{
    CodeRecord, NewUser, NewWish, Stage, UserPatch, UserRecord, WishId, WishRecord,
};

pub trait RelationStore {
    fn find_user(&self, id: &str) -> Result<Option<UserRecord>>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    fn find_wish(&self, id: WishId) -> Result<Option<WishRecord>>;

    fn find_code(&self, user_id: &str) -> Result<Option<CodeRecord>>;

    /// Rows in `requestee`'s pending requests whose requester is `requester`.
    fn count_friend_requests(&self, requestee: &str, requester: &str) -> Result<u64>;

    /// Directed friendship rows `user -> friend`.
    fn count_friendships(&self, user: &str, friend: &str) -> Result<u64>;

    fn count_members(&self, wish: WishId, stage: Stage, user: &str) -> Result<u64>;

    fn list_friends(&self, user: &str, offset: u32, limit: u32) -> Result<Vec<UserRecord>>;

    /// Users with a pending request addressed to `user`.
    fn list_friend_requests(&self, user: &str, offset: u32, limit: u32)
    -> Result<Vec<UserRecord>>;

    fn list_members(
        &self,
        wish: WishId,
        stage: Stage,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<UserRecord>>;

    fn list_wishes(&self, owner: &str, offset: u32, limit: u32) -> Result<Vec<WishRecord>>;

    /// Run `f` inside one transaction. Mutations are committed only if `f`
    /// returns `Ok`; any error, from `f` itself or from a store primitive,
    /// rolls all of them back. Commit failures surface through `E`.
    fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E>,
        E: From<anyhow::Error>;
}

/// Mutation handle scoped to one transaction. The counts observe the
/// transaction's own uncommitted writes.
pub trait StoreTx {
    fn count_friend_requests(&self, requestee: &str, requester: &str) -> Result<u64>;

    fn count_friendships(&self, user: &str, friend: &str) -> Result<u64>;

    fn count_members(&self, wish: WishId, stage: Stage, user: &str) -> Result<u64>;

    fn find_code(&self, user_id: &str) -> Result<Option<CodeRecord>>;

    fn insert_user(&mut self, user: &NewUser) -> Result<()>;

    fn update_user(&mut self, id: &str, patch: &UserPatch) -> Result<()>;

    /// Cascades to the user's wishes, code, stage memberships and friend rows.
    fn delete_user(&mut self, id: &str) -> Result<()>;

    fn set_email_verified(&mut self, id: &str) -> Result<()>;

    fn insert_wish(
        &mut self,
        owner: &str,
        wish: &NewWish,
        created_at: DateTime<Utc>,
    ) -> Result<WishRecord>;

    fn update_wish(&mut self, wish: &WishRecord) -> Result<()>;

    /// Cascades to the wish's stage memberships.
    fn delete_wish(&mut self, id: WishId) -> Result<()>;

    fn add_friend_request(&mut self, requestee: &str, requester: &str) -> Result<()>;

    fn remove_friend_request(&mut self, requestee: &str, requester: &str) -> Result<()>;

    fn add_friendship(&mut self, user: &str, friend: &str) -> Result<()>;

    fn add_member(&mut self, wish: WishId, stage: Stage, user: &str) -> Result<()>;

    fn remove_member(&mut self, wish: WishId, stage: Stage, user: &str) -> Result<()>;

    fn insert_code(&mut self, code: &CodeRecord) -> Result<()>;

    fn delete_code(&mut self, user_id: &str) -> Result<()>;

    fn set_code_retries(&mut self, user_id: &str, retries: u32) -> Result<()>;
}
