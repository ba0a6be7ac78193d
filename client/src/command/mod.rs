//! [`Command`] definition.

pub mod create_listing;
pub mod create_post;
pub mod resolve_session;

/// [`Command`] of the [`Client`].
///
/// [`Client`]: crate::Client
pub use common::Handler as Command;

pub use self::{
    create_listing::CreateListing, create_post::CreatePost,
    resolve_session::ResolveSession,
};
