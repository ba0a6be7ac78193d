//! [`Listing`] read model definition.
//!
//! [`Listing`]: crate::domain::Listing

pub mod market {
    //! Marketplace definitions.

    use std::fmt;

    use common::define_pagination;

    use crate::domain::{listing, Listing};

    define_pagination!(Cursor, Node, Filter);

    /// Node of the marketplace.
    pub type Node = Listing;

    /// Cursor pointing to a specific [`Listing`] in the marketplace.
    pub type Cursor = listing::CreationDateTime;

    /// Filter for a marketplace [`Slice`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// Restricts the marketplace to a single [`listing::Category`].
        pub category: Option<listing::Category>,
    }

    // Cursors are bound to the filter they were obtained under, so the
    // filter has to contribute to operation keys deterministically.
    impl fmt::Display for Filter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.category {
                Some(category) => write!(f, "category={category}"),
                None => write!(f, "all"),
            }
        }
    }
}
