//! Authentication session definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit::Expiration, DateTimeOf};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::user;

/// Claims carried by an access [`Token`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// ID of the user the [`Token`] was issued for.
    pub user_id: user::Id,

    /// [`DateTime`] when the [`Token`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Access token issued by the hosted backend's authentication subsystem.
///
/// Opaque to this core apart from its [`Claims`]; kept behind [`secrecy`] so
/// it never ends up in logs.
#[derive(Clone, Debug)]
pub struct Token(SecretString);

impl Token {
    /// Creates a new [`Token`] from its string representation.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().into())
    }

    /// Exposes the string representation of this [`Token`].
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// [`DateTime`] of a [`Token`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Claims, Expiration)>;
