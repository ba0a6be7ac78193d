//! [`Post`]-related [`Backend`] implementations.

use common::{
    operations::{By, Count, Insert, Select},
    pagination::{Slice, TotalCount},
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{post, Post},
    infra::{
        backend::{self, postgres::Connection, Postgres},
        Backend,
    },
    read::post::feed,
};

impl<C> Backend<Insert<Post>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Insert(post): Insert<Post>,
    ) -> Result<Self::Ok, Self::Err> {
        let Post {
            id,
            author_id,
            content,
            created_at,
        } = post;

        const SQL: &str = "\
            INSERT INTO posts (id, author_id, content, created_at) \
            VALUES ($1::UUID, $2::UUID, $3::VARCHAR, $4::TIMESTAMPTZ)";
        self.exec(SQL, &[&id, &author_id, &content, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Backend<Select<By<Vec<feed::Edge>, feed::Slice>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<feed::Edge>;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<feed::Edge>, feed::Slice>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Slice {
            before,
            limit,
            filter,
        } = by.into_inner();

        let limit = i32::try_from(limit).unwrap();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor = before.iter().format_with("", |cursor, f| {
            ps.push(cursor);
            let idx = ps.len();

            f(&format_args!("AND created_at < ${idx}::TIMESTAMPTZ "))
        });
        let cursor = cursor.to_string();
        let author = filter.author.iter().format_with("", |author, f| {
            ps.push(author);
            let idx = ps.len();

            f(&format_args!("AND author_id = ${idx}::UUID "))
        });
        let author = author.to_string();

        let sql = format!(
            "SELECT id, author_id, content, created_at \
             FROM posts \
             WHERE TRUE \
                   {cursor}\
                   {author}\
             ORDER BY created_at DESC \
             LIMIT $1::INT4",
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let created_at: post::CreationDateTime =
                    row.get("created_at");
                (
                    created_at,
                    Post {
                        id: row.get("id"),
                        author_id: row.get("author_id"),
                        content: row.get("content"),
                        created_at,
                    },
                )
                    .into()
            })
            .collect())
    }
}

impl<C> Backend<Count<feed::Filter>> for Postgres<C>
where
    C: Connection,
{
    type Ok = TotalCount;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Count(filter): Count<feed::Filter>,
    ) -> Result<Self::Ok, Self::Err> {
        let row = if let Some(author) = filter.author {
            const SQL: &str = "\
                SELECT COUNT(*)::INT8 \
                FROM posts \
                WHERE author_id = $1::UUID";
            self.query_opt(SQL, &[&author]).await
        } else {
            // Planner estimate, refreshed by `VACUUM`/`ANALYZE`. Negative
            // until the table is analyzed for the first time.
            const SQL: &str = "\
                SELECT reltuples::INT8 \
                FROM pg_class \
                WHERE relname = 'posts'";
            self.query_opt(SQL, &[]).await
        };
        row.map_err(tracerr::wrap!()).map(|row| {
            let count = row.map_or(0, |r| r.get::<_, i64>(0));
            u64::try_from(count.max(0)).expect("non-negative").into()
        })
    }
}
