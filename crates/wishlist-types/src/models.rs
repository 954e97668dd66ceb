use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of a user. Email and verification state never leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub link: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}
