//! [`Listing`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit::Creation, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::user;

/// Marketplace listing.
#[derive(Clone, Debug, From)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// ID of the user selling this [`Listing`].
    pub seller_id: user::Id,

    /// [`Title`] of this [`Listing`].
    pub title: Title,

    /// Asking price of this [`Listing`].
    ///
    /// Zero-priced listings are giveaways.
    pub price: Money,

    /// [`Category`] this [`Listing`] is filed under.
    pub category: Category,

    /// [`DateTime`] when this [`Listing`] was created.
    ///
    /// Order column of the marketplace: newest first.
    pub created_at: CreationDateTime,
}

/// ID of a [`Listing`].
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

/// Title of a [`Listing`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] without checking its format.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `title` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title && !title.is_empty() && title.len() <= 256
    }
}

define_kind! {
    #[doc = "Category of a [`Listing`]."]
    enum Category {
        #[doc = "Textbooks and course materials."]
        Textbooks = 1,

        #[doc = "Electronics."]
        Electronics = 2,

        #[doc = "Furniture."]
        Furniture = 3,

        #[doc = "Clothing."]
        Clothing = 4,

        #[doc = "Event tickets."]
        Tickets = 5,

        #[doc = "Everything else."]
        Other = 6,
    }
}

/// [`DateTime`] of a [`Listing`] creation.
pub type CreationDateTime = DateTimeOf<(Listing, Creation)>;
