//! Records exchanged between the workflows and the relationship store.

use chrono::{DateTime, Utc};
use wishlist_types::models as views;

pub type WishId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserRecord {
    pub fn view(&self) -> views::User {
        views::User {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WishRecord {
    pub id: WishId,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub link: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl WishRecord {
    pub fn view(&self) -> views::Wish {
        views::Wish {
            id: self.id,
            owner: self.owner.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            link: self.link.clone(),
            image: self.image.clone(),
            created_at: self.created_at,
        }
    }
}

/// A pending or spent email verification code. Only the digest is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    pub user_id: String,
    pub code_hash: String,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWish {
    pub name: String,
    pub description: String,
    pub link: String,
    pub image: String,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct WishPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
}

impl WishPatch {
    pub fn apply(self, wish: &mut WishRecord) {
        if let Some(name) = self.name {
            wish.name = name;
        }
        if let Some(description) = self.description {
            wish.description = description;
        }
        if let Some(link) = self.link {
            wish.link = link;
        }
        if let Some(image) = self.image {
            wish.image = image;
        }
    }
}

/// The three mutually exclusive fulfillment sets a user can belong to for
/// one wish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Stage 1: interest expressed.
    WantToFulfill,
    /// Stage 2: exclusive claim awaiting the owner's decision.
    Claimers,
    /// Stage 3: claim accepted. Terminal.
    Fulfillers,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::WantToFulfill, Stage::Claimers, Stage::Fulfillers];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::WantToFulfill => "want_to_fulfill",
            Stage::Claimers => "claimers",
            Stage::Fulfillers => "fulfillers",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
