//! In-memory [`Backend`] implementation.

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use common::{
    operations::{By, Count, Insert, Select},
    pagination::{Slice, TotalCount},
};
use tracerr::Traced;

use crate::{
    domain::{Listing, Post},
    infra::Backend,
    read,
};

/// In-memory [`Backend`], used by tests and local development.
///
/// Cheap to clone: clones share the same storage. Counts are exact rather
/// than approximate.
#[derive(Clone, Debug, Default)]
pub struct Memory(Rc<Storage>);

/// Storage of a [`Memory`] backend.
#[derive(Debug, Default)]
struct Storage {
    /// Stored [`Post`]s.
    posts: RefCell<Vec<Post>>,

    /// Stored [`Listing`]s.
    listings: RefCell<Vec<Listing>>,
}

impl Backend<Insert<Post>> for Memory {
    type Ok = ();
    type Err = Traced<Infallible>;

    async fn execute(
        &self,
        Insert(post): Insert<Post>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.posts.borrow_mut().push(post);
        Ok(())
    }
}

impl
    Backend<
        Select<By<Vec<read::post::feed::Edge>, read::post::feed::Slice>>,
    > for Memory
{
    type Ok = Vec<read::post::feed::Edge>;
    type Err = Traced<Infallible>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::post::feed::Edge>, read::post::feed::Slice>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let Slice {
            before,
            limit,
            filter,
        } = by.into_inner();

        let mut posts = self
            .0
            .posts
            .borrow()
            .iter()
            .filter(|p| filter.author.map_or(true, |a| p.author_id == a))
            .filter(|p| before.map_or(true, |b| p.created_at < b))
            .cloned()
            .collect::<Vec<_>>();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(posts
            .into_iter()
            .take(limit)
            .map(|p| (p.created_at, p).into())
            .collect())
    }
}

impl Backend<Count<read::post::feed::Filter>> for Memory {
    type Ok = TotalCount;
    type Err = Traced<Infallible>;

    async fn execute(
        &self,
        Count(filter): Count<read::post::feed::Filter>,
    ) -> Result<Self::Ok, Self::Err> {
        let count = self
            .0
            .posts
            .borrow()
            .iter()
            .filter(|p| filter.author.map_or(true, |a| p.author_id == a))
            .count();
        Ok(TotalCount::from(
            u64::try_from(count).expect("infallible"),
        ))
    }
}

impl Backend<Insert<Listing>> for Memory {
    type Ok = ();
    type Err = Traced<Infallible>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.listings.borrow_mut().push(listing);
        Ok(())
    }
}

impl
    Backend<
        Select<
            By<Vec<read::listing::market::Edge>, read::listing::market::Slice>,
        >,
    > for Memory
{
    type Ok = Vec<read::listing::market::Edge>;
    type Err = Traced<Infallible>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::listing::market::Edge>, read::listing::market::Slice>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let Slice {
            before,
            limit,
            filter,
        } = by.into_inner();

        let mut listings = self
            .0
            .listings
            .borrow()
            .iter()
            .filter(|l| filter.category.map_or(true, |c| l.category == c))
            .filter(|l| before.map_or(true, |b| l.created_at < b))
            .cloned()
            .collect::<Vec<_>>();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(listings
            .into_iter()
            .take(limit)
            .map(|l| (l.created_at, l).into())
            .collect())
    }
}

impl Backend<Count<read::listing::market::Filter>> for Memory {
    type Ok = TotalCount;
    type Err = Traced<Infallible>;

    async fn execute(
        &self,
        Count(filter): Count<read::listing::market::Filter>,
    ) -> Result<Self::Ok, Self::Err> {
        let count = self
            .0
            .listings
            .borrow()
            .iter()
            .filter(|l| filter.category.map_or(true, |c| l.category == c))
            .count();
        Ok(TotalCount::from(
            u64::try_from(count).expect("infallible"),
        ))
    }
}
