//! Client contains the data-access core of the application: every network
//! read and write funnels through its [`Gate`] before touching the hosted
//! backend.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod gate;
pub mod infra;
pub mod pager;
pub mod query;
pub mod read;

use derive_more::Debug;

#[cfg(doc)]
use infra::Backend;

pub use self::{command::Command, gate::Gate, query::Query};

/// Default [`Config::page_size`].
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// [`Client`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key of the hosted backend's authentication subsystem.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Number of nodes fetched per page when a query doesn't specify its own
    /// limit.
    pub page_size: usize,
}

impl Config {
    /// Creates a new [`Config`] with the provided [JWT] decoding key and the
    /// [`DEFAULT_PAGE_SIZE`].
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[must_use]
    pub fn new(jwt_decoding_key: jsonwebtoken::DecodingKey) -> Self {
        Self {
            jwt_decoding_key,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Data-access core of the application.
///
/// Cheap to clone: clones share the same [`Gate`].
#[derive(Clone, Debug)]
pub struct Client<B> {
    /// Configuration of this [`Client`].
    config: Config,

    /// [`Backend`] of this [`Client`].
    backend: B,

    /// [`Gate`] of this [`Client`].
    gate: Gate,
}

impl<B> Client<B> {
    /// Creates a new [`Client`] with the provided parameters.
    pub fn new(config: Config, backend: B) -> Self {
        Self {
            config,
            backend,
            gate: Gate::default(),
        }
    }

    /// Returns [`Config`] of this [`Client`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Backend`] of this [`Client`].
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns [`Gate`] of this [`Client`].
    #[must_use]
    pub fn gate(&self) -> &Gate {
        &self.gate
    }
}
