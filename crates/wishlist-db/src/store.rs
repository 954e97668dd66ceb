use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use wishlist_core::model::{
    CodeRecord, NewUser, NewWish, Stage, UserPatch, UserRecord, WishId, WishRecord,
};
use wishlist_core::store::{RelationStore, StoreTx};

use crate::Database;
use crate::queries;

impl RelationStore for Database {
    fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        self.with_conn(|conn| queries::find_user(conn, id))
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.with_conn(|conn| queries::find_user_by_email(conn, email))
    }

    fn find_wish(&self, id: WishId) -> Result<Option<WishRecord>> {
        self.with_conn(|conn| queries::find_wish(conn, id))
    }

    fn find_code(&self, user_id: &str) -> Result<Option<CodeRecord>> {
        self.with_conn(|conn| queries::find_code(conn, user_id))
    }

    fn count_friend_requests(&self, requestee: &str, requester: &str) -> Result<u64> {
        self.with_conn(|conn| queries::count_friend_requests(conn, requestee, requester))
    }

    fn count_friendships(&self, user: &str, friend: &str) -> Result<u64> {
        self.with_conn(|conn| queries::count_friendships(conn, user, friend))
    }

    fn count_members(&self, wish: WishId, stage: Stage, user: &str) -> Result<u64> {
        self.with_conn(|conn| queries::count_members(conn, wish, stage, user))
    }

    fn list_friends(&self, user: &str, offset: u32, limit: u32) -> Result<Vec<UserRecord>> {
        self.with_conn(|conn| queries::list_friends(conn, user, offset, limit))
    }

    fn list_friend_requests(
        &self,
        user: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<UserRecord>> {
        self.with_conn(|conn| queries::list_friend_requests(conn, user, offset, limit))
    }

    fn list_members(
        &self,
        wish: WishId,
        stage: Stage,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<UserRecord>> {
        self.with_conn(|conn| queries::list_members(conn, wish, stage, offset, limit))
    }

    fn list_wishes(&self, owner: &str, offset: u32, limit: u32) -> Result<Vec<WishRecord>> {
        self.with_conn(|conn| queries::list_wishes(conn, owner, offset, limit))
    }

    fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self.lock().map_err(E::from)?;
        let tx = conn
            .transaction()
            .map_err(|e| E::from(anyhow!("Could not begin transaction: {}", e)))?;

        // Dropping `tx` on the error path rolls everything back.
        let out = f(&mut SqliteTx { conn: &tx })?;

        tx.commit()
            .map_err(|e| E::from(anyhow!("Could not commit transaction: {}", e)))?;
        Ok(out)
    }
}

/// Store mutations bound to one open SQLite transaction.
pub struct SqliteTx<'a> {
    conn: &'a Connection,
}

impl StoreTx for SqliteTx<'_> {
    fn count_friend_requests(&self, requestee: &str, requester: &str) -> Result<u64> {
        queries::count_friend_requests(self.conn, requestee, requester)
    }

    fn count_friendships(&self, user: &str, friend: &str) -> Result<u64> {
        queries::count_friendships(self.conn, user, friend)
    }

    fn count_members(&self, wish: WishId, stage: Stage, user: &str) -> Result<u64> {
        queries::count_members(self.conn, wish, stage, user)
    }

    fn find_code(&self, user_id: &str) -> Result<Option<CodeRecord>> {
        queries::find_code(self.conn, user_id)
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<()> {
        queries::insert_user(self.conn, user)
    }

    fn update_user(&mut self, id: &str, patch: &UserPatch) -> Result<()> {
        queries::update_user(self.conn, id, patch)
    }

    fn delete_user(&mut self, id: &str) -> Result<()> {
        queries::delete_user(self.conn, id)
    }

    fn set_email_verified(&mut self, id: &str) -> Result<()> {
        queries::set_email_verified(self.conn, id)
    }

    fn insert_wish(
        &mut self,
        owner: &str,
        wish: &NewWish,
        created_at: DateTime<Utc>,
    ) -> Result<WishRecord> {
        queries::insert_wish(self.conn, owner, wish, created_at)
    }

    fn update_wish(&mut self, wish: &WishRecord) -> Result<()> {
        queries::update_wish(self.conn, wish)
    }

    fn delete_wish(&mut self, id: WishId) -> Result<()> {
        queries::delete_wish(self.conn, id)
    }

    fn add_friend_request(&mut self, requestee: &str, requester: &str) -> Result<()> {
        queries::add_friend_request(self.conn, requestee, requester)
    }

    fn remove_friend_request(&mut self, requestee: &str, requester: &str) -> Result<()> {
        queries::remove_friend_request(self.conn, requestee, requester)
    }

    fn add_friendship(&mut self, user: &str, friend: &str) -> Result<()> {
        queries::add_friendship(self.conn, user, friend)
    }

    fn add_member(&mut self, wish: WishId, stage: Stage, user: &str) -> Result<()> {
        queries::add_member(self.conn, wish, stage, user)
    }

    fn remove_member(&mut self, wish: WishId, stage: Stage, user: &str) -> Result<()> {
        queries::remove_member(self.conn, wish, stage, user)
    }

    fn insert_code(&mut self, code: &CodeRecord) -> Result<()> {
        queries::insert_code(self.conn, code)
    }

    fn delete_code(&mut self, user_id: &str) -> Result<()> {
        queries::delete_code(self.conn, user_id)
    }

    fn set_code_retries(&mut self, user_id: &str, retries: u32) -> Result<()> {
        queries::set_code_retries(self.conn, user_id, retries)
    }
}
