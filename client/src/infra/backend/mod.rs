//! [`Backend`]-related implementations.
//!
//! The hosted backend is the leaf dependency of every operation in this
//! crate: a relational store with column projection, comparison filters,
//! ordering and limits, spoken to through [`Backend`] implementations.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Hosted backend operation.
pub use common::Handler as Backend;

/// [`Backend`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Postgres`] error.
    #[cfg(feature = "postgres")]
    #[display("`Postgres` error: {_0}")]
    Postgres(postgres::Error),
}
