//! SQL for every store primitive, written against a bare `Connection` so the
//! same statements serve plain reads and open transactions.

use crate::models::{CodeRow, UserRow, WishRow, format_timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use wishlist_core::model::{
    CodeRecord, NewUser, NewWish, Stage, UserPatch, UserRecord, WishId, WishRecord,
};

// -- Users --

pub fn find_user(conn: &Connection, id: &str) -> Result<Option<UserRecord>> {
    let sql = format!("SELECT {} FROM users u WHERE u.id = ?1", UserRow::COLUMNS);
    let row = conn.query_row(&sql, [id], UserRow::from_row).optional()?;
    Ok(row.map(UserRecord::from))
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRecord>> {
    let sql = format!("SELECT {} FROM users u WHERE u.email = ?1", UserRow::COLUMNS);
    let row = conn.query_row(&sql, [email], UserRow::from_row).optional()?;
    Ok(row.map(UserRecord::from))
}

pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, password, first_name, last_name) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name
        ],
    )?;
    Ok(())
}

pub fn update_user(conn: &Connection, id: &str, patch: &UserPatch) -> Result<()> {
    conn.execute(
        "UPDATE users SET first_name = ?2, last_name = ?3 WHERE id = ?1",
        params![id, patch.first_name, patch.last_name],
    )?;
    Ok(())
}

pub fn delete_user(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(())
}

pub fn set_email_verified(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("UPDATE users SET email_verified = 1 WHERE id = ?1", [id])?;
    Ok(())
}

// -- Wishes --

pub fn find_wish(conn: &Connection, id: WishId) -> Result<Option<WishRecord>> {
    let sql = format!("SELECT {} FROM wishes WHERE id = ?1", WishRow::COLUMNS);
    conn.query_row(&sql, [id], WishRow::from_row)
        .optional()?
        .map(WishRecord::try_from)
        .transpose()
}

pub fn list_wishes(conn: &Connection, owner: &str, offset: u32, limit: u32) -> Result<Vec<WishRecord>> {
    let sql = format!(
        "SELECT {} FROM wishes WHERE owner = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        WishRow::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![owner, limit, offset], WishRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(WishRecord::try_from).collect()
}

pub fn insert_wish(
    conn: &Connection,
    owner: &str,
    wish: &NewWish,
    created_at: DateTime<Utc>,
) -> Result<WishRecord> {
    conn.execute(
        "INSERT INTO wishes (owner, name, description, link, image, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            owner,
            wish.name,
            wish.description,
            wish.link,
            wish.image,
            format_timestamp(created_at)
        ],
    )?;
    Ok(WishRecord {
        id: conn.last_insert_rowid(),
        owner: owner.to_string(),
        name: wish.name.clone(),
        description: wish.description.clone(),
        link: wish.link.clone(),
        image: wish.image.clone(),
        created_at,
    })
}

pub fn update_wish(conn: &Connection, wish: &WishRecord) -> Result<()> {
    conn.execute(
        "UPDATE wishes SET name = ?2, description = ?3, link = ?4, image = ?5 WHERE id = ?1",
        params![wish.id, wish.name, wish.description, wish.link, wish.image],
    )?;
    Ok(())
}

pub fn delete_wish(conn: &Connection, id: WishId) -> Result<()> {
    conn.execute("DELETE FROM wishes WHERE id = ?1", [id])?;
    Ok(())
}

// -- Codes --

pub fn find_code(conn: &Connection, user_id: &str) -> Result<Option<CodeRecord>> {
    conn.query_row(
        "SELECT user_id, code_hash, retry_count, created_at FROM codes WHERE user_id = ?1",
        [user_id],
        CodeRow::from_row,
    )
    .optional()?
    .map(CodeRecord::try_from)
    .transpose()
}

pub fn insert_code(conn: &Connection, code: &CodeRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO codes (user_id, code_hash, retry_count, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            code.user_id,
            code.code_hash,
            code.retry_count,
            format_timestamp(code.created_at)
        ],
    )?;
    Ok(())
}

pub fn delete_code(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute("DELETE FROM codes WHERE user_id = ?1", [user_id])?;
    Ok(())
}

pub fn set_code_retries(conn: &Connection, user_id: &str, retries: u32) -> Result<()> {
    conn.execute(
        "UPDATE codes SET retry_count = ?2 WHERE user_id = ?1",
        params![user_id, retries],
    )?;
    Ok(())
}

// -- Friendships --

pub fn count_friend_requests(conn: &Connection, requestee: &str, requester: &str) -> Result<u64> {
    count(
        conn,
        "SELECT COUNT(*) FROM friend_requests WHERE user_id = ?1 AND requester_id = ?2",
        params![requestee, requester],
    )
}

pub fn count_friendships(conn: &Connection, user: &str, friend: &str) -> Result<u64> {
    count(
        conn,
        "SELECT COUNT(*) FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
        params![user, friend],
    )
}

pub fn add_friend_request(conn: &Connection, requestee: &str, requester: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO friend_requests (user_id, requester_id) VALUES (?1, ?2)",
        [requestee, requester],
    )?;
    Ok(())
}

pub fn remove_friend_request(conn: &Connection, requestee: &str, requester: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM friend_requests WHERE user_id = ?1 AND requester_id = ?2",
        [requestee, requester],
    )?;
    Ok(())
}

pub fn add_friendship(conn: &Connection, user: &str, friend: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO friendships (user_id, friend_id) VALUES (?1, ?2)",
        [user, friend],
    )?;
    Ok(())
}

pub fn list_friends(conn: &Connection, user: &str, offset: u32, limit: u32) -> Result<Vec<UserRecord>> {
    let sql = format!(
        "SELECT {} FROM friendships f JOIN users u ON u.id = f.friend_id
         WHERE f.user_id = ?1 ORDER BY u.id LIMIT ?2 OFFSET ?3",
        UserRow::COLUMNS
    );
    list_users(conn, &sql, params![user, limit, offset])
}

pub fn list_friend_requests(
    conn: &Connection,
    user: &str,
    offset: u32,
    limit: u32,
) -> Result<Vec<UserRecord>> {
    let sql = format!(
        "SELECT {} FROM friend_requests r JOIN users u ON u.id = r.requester_id
         WHERE r.user_id = ?1 ORDER BY u.id LIMIT ?2 OFFSET ?3",
        UserRow::COLUMNS
    );
    list_users(conn, &sql, params![user, limit, offset])
}

// -- Fulfillment stages --
// Table names come from `Stage::as_str`, never from input.

pub fn count_members(conn: &Connection, wish: WishId, stage: Stage, user: &str) -> Result<u64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE wish_id = ?1 AND user_id = ?2",
        stage.as_str()
    );
    count(conn, &sql, params![wish, user])
}

pub fn add_member(conn: &Connection, wish: WishId, stage: Stage, user: &str) -> Result<()> {
    let sql = format!("INSERT INTO {} (wish_id, user_id) VALUES (?1, ?2)", stage.as_str());
    conn.execute(&sql, params![wish, user])?;
    Ok(())
}

pub fn remove_member(conn: &Connection, wish: WishId, stage: Stage, user: &str) -> Result<()> {
    let sql = format!(
        "DELETE FROM {} WHERE wish_id = ?1 AND user_id = ?2",
        stage.as_str()
    );
    conn.execute(&sql, params![wish, user])?;
    Ok(())
}

pub fn list_members(
    conn: &Connection,
    wish: WishId,
    stage: Stage,
    offset: u32,
    limit: u32,
) -> Result<Vec<UserRecord>> {
    let sql = format!(
        "SELECT {} FROM {} m JOIN users u ON u.id = m.user_id
         WHERE m.wish_id = ?1 ORDER BY u.id LIMIT ?2 OFFSET ?3",
        UserRow::COLUMNS,
        stage.as_str()
    );
    list_users(conn, &sql, params![wish, limit, offset])
}

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(n as u64)
}

fn list_users(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<UserRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, UserRow::from_row)?
        .map(|row| row.map(UserRecord::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
