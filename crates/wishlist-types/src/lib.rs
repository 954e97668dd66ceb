//! Wire types shared between the wishlist HTTP layer and its clients.

pub mod api;
pub mod models;
