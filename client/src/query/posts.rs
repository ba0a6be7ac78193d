//! [`Query`]s of the community feed.

use std::error::Error as StdError;

use common::{
    operations::{By, Count, Select},
    pagination::TotalCount,
};
use tracerr::Traced;

use crate::{gate, infra::Backend, pager, read::post::feed, Client};

use super::Query;

/// [`Query`] of the first [`feed::Page`], along with the feed's approximate
/// total count.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstPage {
    /// Maximum number of [`feed::Edge`]s to fetch.
    ///
    /// Defaults to [`Config::page_size`].
    ///
    /// [`Config::page_size`]: crate::Config::page_size
    pub limit: Option<usize>,

    /// [`feed::Filter`] restricting the feed.
    pub filter: feed::Filter,
}

impl<B, E> Query<FirstPage> for Client<B>
where
    B: Backend<
            Select<By<Vec<feed::Edge>, feed::Slice>>,
            Ok = Vec<feed::Edge>,
            Err = Traced<E>,
        > + Backend<Count<feed::Filter>, Ok = TotalCount, Err = Traced<E>>
        + Clone
        + 'static,
    E: StdError + 'static,
{
    type Ok = feed::First;
    type Err = Traced<gate::ExecutionError>;

    async fn execute(&self, query: FirstPage) -> Result<Self::Ok, Self::Err> {
        let FirstPage { limit, filter } = query;

        let limit = limit.unwrap_or(self.config().page_size);

        #[expect(unsafe_code, reason = "never empty")]
        let key = unsafe {
            gate::Key::new_unchecked(format!("posts:first:{limit}:{filter}"))
        };

        let backend = self.backend().clone();
        self.gate()
            .execute(key, false, move || async move {
                pager::first_page(&backend, limit, filter).await
            })
            .await
    }
}

/// [`Query`] of the next [`feed::Page`], strictly below the provided cursor.
#[derive(Clone, Copy, Debug)]
pub struct NextPage {
    /// [`feed::Cursor`] to continue from, as returned by the previous
    /// [`feed::Page`].
    ///
    /// [`None`] means the feed is already exhausted: an empty [`feed::Page`]
    /// is returned without touching the [`Backend`].
    pub cursor: Option<feed::Cursor>,

    /// Maximum number of [`feed::Edge`]s to fetch.
    ///
    /// Defaults to [`Config::page_size`].
    ///
    /// [`Config::page_size`]: crate::Config::page_size
    pub limit: Option<usize>,

    /// [`feed::Filter`] restricting the feed.
    ///
    /// Has to be the one the `cursor` was obtained under.
    pub filter: feed::Filter,
}

impl<B, E> Query<NextPage> for Client<B>
where
    B: Backend<
            Select<By<Vec<feed::Edge>, feed::Slice>>,
            Ok = Vec<feed::Edge>,
            Err = Traced<E>,
        > + Clone
        + 'static,
    E: StdError + 'static,
{
    type Ok = feed::Page;
    type Err = Traced<gate::ExecutionError>;

    async fn execute(&self, query: NextPage) -> Result<Self::Ok, Self::Err> {
        let NextPage {
            cursor,
            limit,
            filter,
        } = query;

        let limit = limit.unwrap_or(self.config().page_size);
        let at = cursor.map_or_else(|| "end".to_owned(), |c| c.to_rfc3339());

        #[expect(unsafe_code, reason = "never empty")]
        let key = unsafe {
            gate::Key::new_unchecked(format!(
                "posts:next:{at}:{limit}:{filter}",
            ))
        };

        let backend = self.backend().clone();
        self.gate()
            .execute(key, false, move || async move {
                pager::next_page(&backend, cursor, limit, filter).await
            })
            .await
    }
}

#[cfg(test)]
mod spec {
    use common::{operations::Insert, DateTime};

    use crate::{
        domain::{post, user, Post},
        gate::{ExecutionError, Session},
        infra::backend::Memory,
        query::Query as _,
        read::post::feed,
        Client, Config,
    };

    use super::{FirstPage, NextPage};

    fn client() -> Client<Memory> {
        let client = Client::new(
            Config::new(jsonwebtoken::DecodingKey::from_secret(b"secret")),
            Memory::default(),
        );
        client.gate().set_session(Session {
            principal: None,
            is_loaded: true,
        });
        client
    }

    async fn seed(client: &Client<Memory>, count: i64) {
        let author = user::Id::new();
        for secs in 1..=count {
            client
                .backend()
                .execute(Insert(Post {
                    id: post::Id::new(),
                    author_id: author,
                    content: post::Content::new(format!("post {secs}"))
                        .unwrap(),
                    created_at: DateTime::from_unix_timestamp(
                        1_700_000_000 + secs,
                    )
                    .unwrap()
                    .coerce(),
                }))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn rejects_reads_until_session_is_loaded() {
        let client = Client::new(
            Config::new(jsonwebtoken::DecodingKey::from_secret(b"secret")),
            Memory::default(),
        );

        let result = client.execute(FirstPage::default()).await;

        assert!(matches!(
            result.unwrap_err().as_ref(),
            ExecutionError::SessionNotReady,
        ));
    }

    #[tokio::test]
    async fn walks_the_feed_newest_first() {
        let client = client();
        seed(&client, 3).await;

        let first = client
            .execute(FirstPage {
                limit: Some(2),
                filter: feed::Filter::default(),
            })
            .await
            .unwrap();
        assert_eq!(u64::from(first.total_count), 3);
        assert_eq!(first.page.edges.len(), 2);
        assert!(first.page.has_more);
        assert_eq!(
            first.page.edges[0].node.created_at.unix_timestamp(),
            1_700_000_000 + 3,
        );

        let next = client
            .execute(NextPage {
                cursor: first.page.cursor().copied(),
                limit: Some(2),
                filter: feed::Filter::default(),
            })
            .await
            .unwrap();
        assert_eq!(next.edges.len(), 1);
        assert!(!next.has_more);
    }

    #[tokio::test]
    async fn exhausted_feed_is_a_terminal_no_op() {
        let client = client();
        seed(&client, 2).await;

        let page = client
            .execute(NextPage {
                cursor: None,
                limit: Some(2),
                filter: feed::Filter::default(),
            })
            .await
            .unwrap();

        assert!(page.edges.is_empty());
        assert!(!page.has_more);
    }
}
