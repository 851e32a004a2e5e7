// src/store/postgres.rs
//! Postgres adapter for the persistence port.
//!
//! SQL is built at runtime with `QueryBuilder` (no `query!` macros), so the
//! crate compiles without a database. Tables are described in `schema.sql`.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{Query, Record, Store, Value};
use crate::error::StoreError;

pub struct PgStore<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> PgStore<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Uuid(v) => builder.push_bind(v),
        Value::Text(v) => builder.push_bind(v),
        Value::Bool(v) => builder.push_bind(v),
        Value::Timestamp(v) => builder.push_bind(v),
    };
}

fn push_filters<R: Record>(builder: &mut QueryBuilder<'_, Postgres>, query: &Query<R>) {
    for (i, (column, value)) in query.filters().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(*column).push(" = ");
        push_value(builder, value.clone());
    }
}

/// `INSERT ... ON CONFLICT (id) DO UPDATE`, reporting whether the row existed.
fn upsert<R: Record>(record: &R) -> QueryBuilder<'static, Postgres> {
    let columns = record.columns();
    let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", R::TABLE));

    for (i, (column, _)) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(*column);
    }

    builder.push(") VALUES (");
    for (i, (_, value)) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value.clone());
    }

    builder.push(") ON CONFLICT (id) DO UPDATE SET ");
    for (i, (column, _)) in columns.iter().skip(1).enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(format!("{column} = EXCLUDED.{column}"));
    }

    // xmax is zero only for freshly inserted tuples
    builder.push(" RETURNING (xmax::text::bigint <> 0) AS updated");
    builder
}

#[async_trait]
impl<R> Store<R> for PgStore<R>
where
    R: Record + for<'r> FromRow<'r, PgRow>,
{
    async fn save(&self, record: &R) -> Result<bool, StoreError> {
        debug!(table = R::TABLE, id = %record.id(), "saving row");

        let updated = upsert(record)
            .build_query_scalar::<bool>()
            .fetch_one(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn find_one(&self, query: &Query<R>) -> Result<R, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT * FROM {}", R::TABLE));
        push_filters(&mut builder, query);
        builder.push(" ORDER BY id LIMIT 1");

        builder
            .build_query_as::<R>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} not found", R::NAME)))
    }

    async fn find_all(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT * FROM {}", R::TABLE));
        push_filters(&mut builder, query);
        builder.push(" ORDER BY id");

        let rows = builder.build_query_as::<R>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn delete(&self, record: &R) -> Result<(), StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", R::TABLE))
            .bind(record.id())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{} not found", R::NAME)));
        }

        Ok(())
    }

    async fn count(&self, query: &Query<R>) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", R::TABLE));
        push_filters(&mut builder, query);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
