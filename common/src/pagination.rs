//! Abstractions for descending keyset pagination.
//!
//! Lists are always traversed newest-first: a [`Slice`] selects up to
//! `limit` rows strictly below the `before` cursor on the order column, and
//! the cursor of the produced [`Page`] is the order-column value of its last
//! [`Edge`]. Offsets are never used, so concurrent inserts cannot skew an
//! ongoing traversal (rows inserted after the first page was taken are
//! silently skipped, which is the accepted behavior of keyset pagination).

use derive_more::{From, Into};

/// An edge in a [`Page`]: a node together with its cursor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edge<C, N> {
    /// Cursor of this [`Edge`] (its node's order-column value).
    pub cursor: C,

    /// Node of this [`Edge`].
    pub node: N,
}

impl<C, N> From<(C, N)> for Edge<C, N> {
    fn from((cursor, node): (C, N)) -> Self {
        Self { cursor, node }
    }
}

/// One fetched slice of a remote ordered collection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page<C, N> {
    /// [`Edge`]s of this [`Page`], strictly descending by the order column.
    pub edges: Vec<Edge<C, N>>,

    /// Indicator whether the collection may contain more nodes below this
    /// [`Page`].
    ///
    /// `true` iff the slice came back full: a short slice means exhaustion,
    /// while a full one followed by an exactly-empty remainder merely makes
    /// the next fetch return an empty [`Page`].
    pub has_more: bool,
}

impl<C, N> Page<C, N> {
    /// Creates a new [`Page`] from the [`Edge`]s returned for a slice of the
    /// provided `limit`.
    #[must_use]
    pub fn new(
        edges: impl IntoIterator<Item = impl Into<Edge<C, N>>>,
        limit: usize,
    ) -> Self {
        let edges =
            edges.into_iter().map(Into::into).collect::<Vec<_>>();
        Self {
            has_more: edges.len() == limit,
            edges,
        }
    }

    /// Creates a new empty [`Page`] with no more nodes to fetch.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            has_more: false,
        }
    }

    /// Returns the cursor to continue this [`Page`] from: the order-column
    /// value of its last [`Edge`], or [`None`] if the [`Page`] is empty.
    #[must_use]
    pub fn cursor(&self) -> Option<&C> {
        self.edges.last().map(|e| &e.cursor)
    }

    /// Consumes this [`Page`] and returns its nodes.
    #[must_use]
    pub fn into_nodes(self) -> Vec<N> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

/// First [`Page`] of a collection, carrying its [`TotalCount`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct First<C, N> {
    /// The fetched [`Page`].
    pub page: Page<C, N>,

    /// Approximate [`TotalCount`] of the whole collection.
    pub total_count: TotalCount,
}

/// Approximate total count of nodes in a collection.
///
/// Fast rather than exact: backends are free to serve an estimate, as long
/// as producing it never requires a full collection scan.
#[derive(
    Clone, Copy, Debug, Default, Eq, From, Hash, Into, Ord, PartialEq,
    PartialOrd,
)]
pub struct TotalCount(u64);

/// Selector of one slice of a collection.
#[derive(Clone, Copy, Debug)]
pub struct Slice<C, F = ()> {
    /// Exclusive upper bound on the order column, or [`None`] to start from
    /// the newest row.
    ///
    /// Rows tying exactly on the order column are given no deterministic
    /// tie-break: a boundary falling inside such a tie may skip or repeat
    /// the tied rows.
    pub before: Option<C>,

    /// Maximum number of rows to fetch.
    pub limit: usize,

    /// Additional filter the slice is restricted by.
    ///
    /// Cursors are only meaningful in combination with the same filter they
    /// were obtained under.
    pub filter: F,
}

/// Defines pagination types for a read model.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "[`Edge`] of a [`Page`]."]
        pub type Edge = $crate::pagination::Edge<$cursor, $node>;

        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "[`First`] [`Page`] of the collection."]
        pub type First = $crate::pagination::First<$cursor, $node>;

        #[doc = "[`Slice`] selector of a [`Page`]."]
        pub type Slice = $crate::pagination::Slice<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Edge, Page};

    fn edges(cursors: &[i64]) -> Vec<Edge<i64, i64>> {
        cursors.iter().map(|&c| Edge { cursor: c, node: c }).collect()
    }

    #[test]
    fn full_page_has_more() {
        let page = Page::new(edges(&[30, 20, 10]), 3);
        assert!(page.has_more);
        assert_eq!(page.cursor(), Some(&10));
    }

    #[test]
    fn short_page_is_exhausted() {
        let page = Page::new(edges(&[30, 20]), 3);
        assert!(!page.has_more);
        assert_eq!(page.cursor(), Some(&20));
    }

    #[test]
    fn empty_page_has_no_cursor() {
        let page = Page::<i64, i64>::new(edges(&[]), 3);
        assert!(!page.has_more);
        assert_eq!(page.cursor(), None);
        assert_eq!(page, Page::empty());
    }
}
