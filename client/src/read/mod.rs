//! Read models of the domain.

pub mod listing;
pub mod post;
