//! Keyset pagination over a remote [`Backend`] collection.
//!
//! Both functions are stateless: the calling code holds the accumulated
//! nodes, the cursor and the `has_more` indicator, and decides when to ask
//! for the next [`Page`] (an explicit "load more", an infinite-scroll
//! trigger). Remote failures propagate unchanged, no retry is attempted
//! here.

use common::{
    operations::{By, Count, Select},
    pagination::{Edge, First, Page, Slice, TotalCount},
};
use tracerr::Traced;

use crate::infra::Backend;

/// Fetches the [`First`] page of a collection: its approximate
/// [`TotalCount`] and up to `limit` newest nodes matching the `filter`.
///
/// # Errors
///
/// Propagates the [`Backend`] failure unchanged.
pub async fn first_page<B, C, N, F, E>(
    backend: &B,
    limit: usize,
    filter: F,
) -> Result<First<C, N>, Traced<E>>
where
    B: Backend<
            Select<By<Vec<Edge<C, N>>, Slice<C, F>>>,
            Ok = Vec<Edge<C, N>>,
            Err = Traced<E>,
        > + Backend<Count<F>, Ok = TotalCount, Err = Traced<E>>,
    F: Clone,
{
    let total_count = backend
        .execute(Count(filter.clone()))
        .await
        .map_err(tracerr::wrap!())?;
    let edges = backend
        .execute(Select(By::new(Slice {
            before: None,
            limit,
            filter,
        })))
        .await
        .map_err(tracerr::wrap!())?;

    Ok(First {
        page: Page::new(edges, limit),
        total_count,
    })
}

/// Fetches the next [`Page`] of a collection: up to `limit` nodes strictly
/// below the `cursor` on the order column, matching the `filter`.
///
/// A [`None`] `cursor` means the collection is already exhausted: an empty
/// [`Page`] is returned without touching the [`Backend`] at all.
///
/// Feeding every returned [`Page::cursor()`] back into this function
/// partitions the collection into non-overlapping, strictly descending
/// slices (modulo rows inserted concurrently above the cursor, which are
/// skipped).
///
/// # Errors
///
/// Propagates the [`Backend`] failure unchanged.
pub async fn next_page<B, C, N, F, E>(
    backend: &B,
    cursor: Option<C>,
    limit: usize,
    filter: F,
) -> Result<Page<C, N>, Traced<E>>
where
    B: Backend<
        Select<By<Vec<Edge<C, N>>, Slice<C, F>>>,
        Ok = Vec<Edge<C, N>>,
        Err = Traced<E>,
    >,
{
    let Some(before) = cursor else {
        return Ok(Page::empty());
    };

    let edges = backend
        .execute(Select(By::new(Slice {
            before: Some(before),
            limit,
            filter,
        })))
        .await
        .map_err(tracerr::wrap!())?;

    Ok(Page::new(edges, limit))
}

#[cfg(test)]
mod spec {
    use common::{
        operations::Insert, pagination::TotalCount, DateTime, Handler as _,
    };

    use crate::{
        domain::{post, user, Post},
        infra::backend::Memory,
        read::post::feed,
    };

    use super::{first_page, next_page};

    fn post(author: user::Id, secs: i64) -> Post {
        Post {
            id: post::Id::new(),
            author_id: author,
            content: post::Content::new(format!("posted at {secs}"))
                .unwrap(),
            created_at: DateTime::from_unix_timestamp(1_700_000_000 + secs)
                .unwrap()
                .coerce(),
        }
    }

    async fn seeded(count: i64) -> Memory {
        let memory = Memory::default();
        let author = user::Id::new();
        for secs in 1..=count {
            memory.execute(Insert(post(author, secs))).await.unwrap();
        }
        memory
    }

    #[tokio::test]
    async fn empty_collection_yields_an_empty_first_page() {
        let memory = Memory::default();

        let first: feed::First =
            first_page(&memory, 20, feed::Filter::default()).await.unwrap();

        assert_eq!(first.total_count, TotalCount::from(0));
        assert!(first.page.edges.is_empty());
        assert_eq!(first.page.cursor(), None);
        assert!(!first.page.has_more);
    }

    #[tokio::test]
    async fn paginates_25_rows_by_20() {
        let memory = seeded(25).await;

        let first: feed::First =
            first_page(&memory, 20, feed::Filter::default()).await.unwrap();
        assert_eq!(first.total_count, TotalCount::from(25));
        assert_eq!(first.page.edges.len(), 20);
        assert!(first.page.has_more);
        let cursor = first.page.cursor().copied();
        assert_eq!(
            cursor.unwrap().unix_timestamp(),
            1_700_000_000 + 6, // the 20th newest row
        );

        let next: feed::Page =
            next_page(&memory, cursor, 20, feed::Filter::default())
                .await
                .unwrap();
        assert_eq!(next.edges.len(), 5);
        assert!(!next.has_more);
        assert_eq!(
            next.cursor().unwrap().unix_timestamp(),
            1_700_000_000 + 1, // the oldest row
        );
    }

    #[tokio::test]
    async fn partitions_the_whole_collection() {
        let memory = seeded(7).await;

        let first: feed::First =
            first_page(&memory, 3, feed::Filter::default()).await.unwrap();
        let mut nodes = first.page.edges.clone();
        let mut cursor = first.page.cursor().copied();
        let mut has_more = first.page.has_more;

        while has_more {
            let page: feed::Page =
                next_page(&memory, cursor, 3, feed::Filter::default())
                    .await
                    .unwrap();
            cursor = page.cursor().copied();
            has_more = page.has_more;
            nodes.extend(page.edges);
        }
        // The trailing empty page of the knife-edge case is benign.
        assert_eq!(nodes.len(), 7);
        assert!(nodes
            .windows(2)
            .all(|pair| pair[0].cursor > pair[1].cursor));
    }

    #[tokio::test]
    async fn exhausted_cursor_is_a_terminal_no_op() {
        let memory = seeded(3).await;

        let page: feed::Page =
            next_page(&memory, None, 20, feed::Filter::default())
                .await
                .unwrap();

        assert!(page.edges.is_empty());
        assert_eq!(page.cursor(), None);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn filters_restrict_both_count_and_slices() {
        let memory = Memory::default();
        let author = user::Id::new();
        let other = user::Id::new();
        for secs in 1..=4 {
            memory.execute(Insert(post(author, secs))).await.unwrap();
            memory
                .execute(Insert(post(other, 100 + secs)))
                .await
                .unwrap();
        }

        let filter = feed::Filter {
            author: Some(author),
        };
        let first: feed::First =
            first_page(&memory, 3, filter).await.unwrap();

        assert_eq!(first.total_count, TotalCount::from(4));
        assert_eq!(first.page.edges.len(), 3);
        assert!(first
            .page
            .edges
            .iter()
            .all(|e| e.node.author_id == author));

        let next: feed::Page =
            next_page(&memory, first.page.cursor().copied(), 3, filter)
                .await
                .unwrap();
        assert_eq!(next.edges.len(), 1);
        assert!(!next.has_more);
    }
}
