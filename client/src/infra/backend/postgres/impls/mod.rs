//! [`Backend`] implementations.
//!
//! [`Backend`]: crate::infra::Backend

#![allow(
    clippy::items_after_statements,
    reason = "`const SQL` after statements"
)]

mod listing;
mod post;
