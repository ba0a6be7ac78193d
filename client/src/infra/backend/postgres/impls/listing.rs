//! [`Listing`]-related [`Backend`] implementations.

use common::{
    operations::{By, Count, Insert, Select},
    pagination::{Slice, TotalCount},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{listing, Listing},
    infra::{
        backend::{self, postgres::Connection, Postgres},
        Backend,
    },
    read::listing::market,
};

impl<C> Backend<Insert<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        let Listing {
            id,
            seller_id,
            title,
            price,
            category,
            created_at,
        } = listing;

        let price_amount = price.amount();
        let price_currency = price.currency();

        const SQL: &str = "\
            INSERT INTO listings (id, seller_id, title, \
                                  price_amount, price_currency, \
                                  category, created_at) \
            VALUES ($1::UUID, $2::UUID, $3::VARCHAR, \
                    $4::NUMERIC, $5::INT2, \
                    $6::INT2, $7::TIMESTAMPTZ)";
        self.exec(
            SQL,
            &[
                &id,
                &seller_id,
                &title,
                &price_amount,
                &price_currency,
                &category,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Backend<Select<By<Vec<market::Edge>, market::Slice>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<market::Edge>;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<market::Edge>, market::Slice>>,
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
        let category = filter.category.iter().format_with("", |category, f| {
            ps.push(category);
            let idx = ps.len();

            f(&format_args!("AND category = ${idx}::INT2 "))
        });
        let category = category.to_string();

        let sql = format!(
            "SELECT id, seller_id, title, \
                    price_amount, price_currency, \
                    category, created_at \
             FROM listings \
             WHERE TRUE \
                   {cursor}\
                   {category}\
             ORDER BY created_at DESC \
             LIMIT $1::INT4",
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let created_at: listing::CreationDateTime =
                    row.get("created_at");
                (
                    created_at,
                    Listing {
                        id: row.get("id"),
                        seller_id: row.get("seller_id"),
                        title: row.get("title"),
                        price: Money::new(
                            row.get("price_amount"),
                            row.get("price_currency"),
                        )
                        .expect("non-negative price"),
                        category: row.get("category"),
                        created_at,
                    },
                )
                    .into()
            })
            .collect())
    }
}

impl<C> Backend<Count<market::Filter>> for Postgres<C>
where
    C: Connection,
{
    type Ok = TotalCount;
    type Err = Traced<backend::Error>;

    async fn execute(
        &self,
        Count(filter): Count<market::Filter>,
    ) -> Result<Self::Ok, Self::Err> {
        let row = if let Some(category) = filter.category {
            const SQL: &str = "\
                SELECT COUNT(*)::INT8 \
                FROM listings \
                WHERE category = $1::INT2";
            self.query_opt(SQL, &[&category]).await
        } else {
            // Planner estimate, refreshed by `VACUUM`/`ANALYZE`. Negative
            // until the table is analyzed for the first time.
            const SQL: &str = "\
                SELECT reltuples::INT8 \
                FROM pg_class \
                WHERE relname = 'listings'";
            self.query_opt(SQL, &[]).await
        };
        row.map_err(tracerr::wrap!()).map(|row| {
            let count = row.map_or(0, |r| r.get::<_, i64>(0));
            u64::try_from(count.max(0)).expect("non-negative").into()
        })
    }
}
