//! Social wishlist workflows: friendships, the wish fulfillment lifecycle,
//! and the guards in front of them. Everything here is synchronous and
//! written against the [`store::RelationStore`] traits.

pub mod error;
pub mod friendship;
pub mod fulfillment;
pub mod gate;
pub mod guard;
pub mod model;
pub mod page;
pub mod store;
pub mod users;
pub mod verification;
pub mod wishes;

#[cfg(test)]
pub mod memory;

pub use error::{Entity, ErrorKind, Result, WorkflowError};
pub use fulfillment::FulfillmentPolicy;
pub use model::{Stage, WishId};
pub use page::Page;
pub use store::{RelationStore, StoreTx};
