//! Domain definitions.

pub mod listing;
pub mod post;
pub mod user;

pub use self::{listing::Listing, post::Post};
