//! [`Query`]s of the marketplace.

use std::error::Error as StdError;

use common::{
    operations::{By, Count, Select},
    pagination::TotalCount,
};
use tracerr::Traced;

use crate::{
    gate, infra::Backend, pager, read::listing::market, Client,
};

use super::Query;

/// [`Query`] of the first [`market::Page`], along with the marketplace's
/// approximate total count.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstPage {
    /// Maximum number of [`market::Edge`]s to fetch.
    ///
    /// Defaults to [`Config::page_size`].
    ///
    /// [`Config::page_size`]: crate::Config::page_size
    pub limit: Option<usize>,

    /// [`market::Filter`] restricting the marketplace.
    pub filter: market::Filter,
}

impl<B, E> Query<FirstPage> for Client<B>
where
    B: Backend<
            Select<By<Vec<market::Edge>, market::Slice>>,
            Ok = Vec<market::Edge>,
            Err = Traced<E>,
        > + Backend<Count<market::Filter>, Ok = TotalCount, Err = Traced<E>>
        + Clone
        + 'static,
    E: StdError + 'static,
{
    type Ok = market::First;
    type Err = Traced<gate::ExecutionError>;

    async fn execute(&self, query: FirstPage) -> Result<Self::Ok, Self::Err> {
        let FirstPage { limit, filter } = query;

        let limit = limit.unwrap_or(self.config().page_size);

        #[expect(unsafe_code, reason = "never empty")]
        let key = unsafe {
            gate::Key::new_unchecked(format!(
                "listings:first:{limit}:{filter}",
            ))
        };

        let backend = self.backend().clone();
        self.gate()
            .execute(key, false, move || async move {
                pager::first_page(&backend, limit, filter).await
            })
            .await
    }
}

/// [`Query`] of the next [`market::Page`], strictly below the provided
/// cursor.
#[derive(Clone, Copy, Debug)]
pub struct NextPage {
    /// [`market::Cursor`] to continue from, as returned by the previous
    /// [`market::Page`].
    ///
    /// [`None`] means the marketplace is already exhausted: an empty
    /// [`market::Page`] is returned without touching the [`Backend`].
    pub cursor: Option<market::Cursor>,

    /// Maximum number of [`market::Edge`]s to fetch.
    ///
    /// Defaults to [`Config::page_size`].
    ///
    /// [`Config::page_size`]: crate::Config::page_size
    pub limit: Option<usize>,

    /// [`market::Filter`] restricting the marketplace.
    ///
    /// Has to be the one the `cursor` was obtained under.
    pub filter: market::Filter,
}

impl<B, E> Query<NextPage> for Client<B>
where
    B: Backend<
            Select<By<Vec<market::Edge>, market::Slice>>,
            Ok = Vec<market::Edge>,
            Err = Traced<E>,
        > + Clone
        + 'static,
    E: StdError + 'static,
{
    type Ok = market::Page;
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
                "listings:next:{at}:{limit}:{filter}",
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
    use common::{operations::Insert, DateTime, Money};

    use crate::{
        domain::{listing, user, Listing},
        gate::Session,
        infra::backend::Memory,
        query::Query as _,
        read::listing::market,
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

    async fn seed(
        client: &Client<Memory>,
        category: listing::Category,
        secs: i64,
    ) {
        client
            .backend()
            .execute(Insert(Listing {
                id: listing::Id::new(),
                seller_id: user::Id::new(),
                title: listing::Title::new(format!("listing {secs}"))
                    .unwrap(),
                price: "10USD".parse::<Money>().unwrap(),
                category,
                created_at: DateTime::from_unix_timestamp(
                    1_700_000_000 + secs,
                )
                .unwrap()
                .coerce(),
            }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn filters_the_marketplace_by_category() {
        let client = client();
        for secs in 1..=3 {
            seed(&client, listing::Category::Textbooks, secs).await;
            seed(&client, listing::Category::Furniture, 100 + secs).await;
        }

        let filter = market::Filter {
            category: Some(listing::Category::Textbooks),
        };
        let first = client
            .execute(FirstPage {
                limit: Some(2),
                filter,
            })
            .await
            .unwrap();

        assert_eq!(u64::from(first.total_count), 3);
        assert_eq!(first.page.edges.len(), 2);
        assert!(first.page.has_more);
        assert!(first.page.edges.iter().all(|e| {
            e.node.category == listing::Category::Textbooks
        }));

        let next = client
            .execute(NextPage {
                cursor: first.page.cursor().copied(),
                limit: Some(2),
                filter,
            })
            .await
            .unwrap();
        assert_eq!(next.edges.len(), 1);
        assert!(!next.has_more);
    }
}
