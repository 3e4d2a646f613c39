use sqlx::postgres::{PgArguments, PgRow};
use sqlx::types::Json;
use sqlx::{Arguments, FromRow, PgExecutor, Row};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, SqlParam, SqlResult};

/// Executes a `Filter` (or raw `SqlResult`) against any Postgres executor,
/// so the same query runs on the pool or inside a transaction.
pub struct QueryBuilder<T> {
    sql: SqlResult,
    count_sql: Option<SqlResult>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn from_filter(filter: &Filter) -> Result<Self, DatabaseError> {
        Ok(Self {
            sql: filter.to_sql()?,
            count_sql: Some(filter.to_count_sql()?),
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn raw(sql: SqlResult) -> Self {
        Self { sql, count_sql: None, _phantom: std::marker::PhantomData }
    }

    pub async fn select_all<'e, E: PgExecutor<'e>>(&self, executor: E) -> Result<Vec<T>, DatabaseError> {
        let rows = sqlx::query_as_with::<_, T, _>(&self.sql.query, bind_params(&self.sql.params))
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn select_one<'e, E: PgExecutor<'e>>(&self, executor: E) -> Result<T, DatabaseError> {
        let row = sqlx::query_as_with::<_, T, _>(&self.sql.query, bind_params(&self.sql.params))
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn select_optional<'e, E: PgExecutor<'e>>(&self, executor: E) -> Result<Option<T>, DatabaseError> {
        let row = sqlx::query_as_with::<_, T, _>(&self.sql.query, bind_params(&self.sql.params))
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn count<'e, E: PgExecutor<'e>>(&self, executor: E) -> Result<i64, DatabaseError> {
        let sql = self
            .count_sql
            .as_ref()
            .ok_or_else(|| DatabaseError::QueryError("count requested on a raw query".to_string()))?;
        let row = sqlx::query_with(&sql.query, bind_params(&sql.params)).fetch_one(executor).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

/// Run a statement that returns no rows; yields rows affected
pub async fn execute<'e, E: PgExecutor<'e>>(executor: E, sql: &SqlResult) -> Result<u64, DatabaseError> {
    let result = sqlx::query_with(&sql.query, bind_params(&sql.params)).execute(executor).await?;
    Ok(result.rows_affected())
}

pub fn bind_params(params: &[SqlParam]) -> PgArguments {
    let mut args = PgArguments::default();
    for p in params {
        match p {
            SqlParam::Text(v) => args.add(v.clone()),
            SqlParam::Int(v) => args.add(*v),
            SqlParam::Int4(v) => args.add(*v),
            SqlParam::Float(v) => args.add(*v),
            SqlParam::Bool(v) => args.add(*v),
            SqlParam::Uuid(v) => args.add(*v),
            SqlParam::UuidArray(v) => args.add(v.clone()),
            SqlParam::Date(v) => args.add(*v),
            SqlParam::Timestamp(v) => args.add(*v),
            SqlParam::Decimal(v) => args.add(*v),
            SqlParam::TextArray(v) => args.add(v.clone()),
            SqlParam::Json(v) => args.add(Json(v.clone())),
        }
    }
    args
}
