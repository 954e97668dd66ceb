//! Database row types. These map directly to SQLite rows and are converted
//! into the core records at the crate boundary.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use wishlist_core::model::{CodeRecord, UserRecord, WishRecord};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserRow {
    pub const COLUMNS: &'static str =
        "u.id, u.email, u.email_verified, u.password, u.first_name, u.last_name";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            email_verified: row.get(2)?,
            password: row.get(3)?,
            first_name: row.get(4)?,
            last_name: row.get(5)?,
        })
    }
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            email: row.email,
            email_verified: row.email_verified,
            password_hash: row.password,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

pub struct WishRow {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub link: String,
    pub image: String,
    pub created_at: String,
}

impl WishRow {
    pub const COLUMNS: &'static str = "id, owner, name, description, link, image, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            link: row.get(4)?,
            image: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl TryFrom<WishRow> for WishRecord {
    type Error = anyhow::Error;

    fn try_from(row: WishRow) -> Result<Self> {
        Ok(WishRecord {
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            owner: row.owner,
            name: row.name,
            description: row.description,
            link: row.link,
            image: row.image,
        })
    }
}

pub struct CodeRow {
    pub user_id: String,
    pub code_hash: String,
    pub retry_count: u32,
    pub created_at: String,
}

impl CodeRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            code_hash: row.get(1)?,
            retry_count: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl TryFrom<CodeRow> for CodeRecord {
    type Error = anyhow::Error;

    fn try_from(row: CodeRow) -> Result<Self> {
        Ok(CodeRecord {
            created_at: parse_timestamp(&row.created_at)?,
            user_id: row.user_id,
            code_hash: row.code_hash,
            retry_count: row.retry_count,
        })
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Bad timestamp in database: {}", raw))?;
    Ok(parsed.with_timezone(&Utc))
}
