//! Infrastructure layer.

pub mod backend;

pub use self::backend::Backend;
#[cfg(feature = "postgres")]
pub use self::backend::{postgres, Postgres};
