//! [`Post`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit::Creation, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::user;

/// Post in the community feed.
#[derive(Clone, Debug, From)]
pub struct Post {
    /// ID of this [`Post`].
    pub id: Id,

    /// ID of the user who authored this [`Post`].
    pub author_id: user::Id,

    /// [`Content`] of this [`Post`].
    pub content: Content,

    /// [`DateTime`] when this [`Post`] was created.
    ///
    /// Order column of the feed: newest first.
    pub created_at: CreationDateTime,
}

/// ID of a [`Post`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Content of a [`Post`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Content(String);

impl Content {
    /// Creates a new [`Content`] without checking its format.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `content` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    /// Creates a new [`Content`] if the given `content` is valid.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        Self::check(&content).then_some(Self(content))
    }

    /// Checks whether the given `content` is a valid [`Content`].
    fn check(content: impl AsRef<str>) -> bool {
        let content = content.as_ref();
        content.trim() == content
            && !content.is_empty()
            && content.len() <= 4096
    }
}

/// [`DateTime`] of a [`Post`] creation.
pub type CreationDateTime = DateTimeOf<(Post, Creation)>;
