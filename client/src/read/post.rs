//! [`Post`] read model definition.
//!
//! [`Post`]: crate::domain::Post

pub mod feed {
    //! Community feed definitions.

    use std::fmt;

    use common::define_pagination;

    use crate::domain::{post, user, Post};

    define_pagination!(Cursor, Node, Filter);

    /// Node of the feed.
    pub type Node = Post;

    /// Cursor pointing to a specific [`Post`] in the feed.
    pub type Cursor = post::CreationDateTime;

    /// Filter for a feed [`Slice`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// Restricts the feed to [`Post`]s of a single author.
        pub author: Option<user::Id>,
    }

    // Cursors are bound to the filter they were obtained under, so the
    // filter has to contribute to operation keys deterministically.
    impl fmt::Display for Filter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.author {
                Some(author) => write!(f, "author={author}"),
                None => write!(f, "all"),
            }
        }
    }
}
