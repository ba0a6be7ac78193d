//! [`Query`] definition.

pub mod listings;
pub mod posts;

/// [`Query`] of the [`Client`].
///
/// [`Client`]: crate::Client
pub use common::Handler as Query;
