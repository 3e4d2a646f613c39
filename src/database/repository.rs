use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::changeset::Changeset;
use crate::database::manager::DatabaseError;
use crate::database::query_builder::{self, QueryBuilder};
use crate::filter::{Filter, Page, Pagination, SqlParam, SqlResult};

/// Table-bound CRUD helpers shared by every resource
pub struct Repository<T> {
    table_name: &'static str,
    entity: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: &'static str, entity: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            entity,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.table_name
    }

    pub fn filter(&self) -> Result<Filter, DatabaseError> {
        Ok(Filter::new(self.table_name)?)
    }

    /// Run the filter's count and page queries together
    pub async fn select_page(&self, filter: &Filter) -> Result<Page<T>, DatabaseError> {
        let request = filter
            .page_request()
            .ok_or_else(|| DatabaseError::QueryError("select_page requires a page window".to_string()))?;
        let builder = QueryBuilder::<T>::from_filter(filter)?;
        let (total, items) = futures::try_join!(builder.count(&self.pool), builder.select_all(&self.pool))?;
        Ok(Page {
            pagination: Pagination::new(request, total),
            items,
        })
    }

    pub async fn select_one(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let mut filter = self.filter()?;
        filter.where_eq("id", id);
        QueryBuilder::<T>::from_filter(&filter)?.select_optional(&self.pool).await
    }

    pub async fn select_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.select_one(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", self.entity)))
    }

    pub async fn insert(&self, changes: &Changeset) -> Result<T, DatabaseError> {
        self.insert_with(&self.pool, changes).await
    }

    pub async fn insert_with<'e, E: PgExecutor<'e>>(&self, executor: E, changes: &Changeset) -> Result<T, DatabaseError> {
        let sql = changes.to_insert_sql(self.table_name)?;
        QueryBuilder::<T>::raw(sql)
            .select_one(executor)
            .await
            .map_err(|e| self.conflict_or(e))
    }

    pub async fn update(&self, id: Uuid, changes: &Changeset) -> Result<T, DatabaseError> {
        self.update_with(&self.pool, id, changes).await
    }

    pub async fn update_with<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
        changes: &Changeset,
    ) -> Result<T, DatabaseError> {
        let sql = changes.to_update_sql(self.table_name, id)?;
        QueryBuilder::<T>::raw(sql)
            .select_optional(executor)
            .await
            .map_err(|e| self.conflict_or(e))?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", self.entity)))
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.soft_delete_with(&self.pool, id).await
    }

    pub async fn soft_delete_with<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<T, DatabaseError> {
        let sql = SqlResult {
            query: format!(
                "UPDATE \"{}\" SET \"deleted_at\" = now(), \"updated_at\" = now() \
                 WHERE \"id\" = $1 AND \"deleted_at\" IS NULL RETURNING *",
                self.table_name
            ),
            params: vec![SqlParam::from(id)],
        };
        QueryBuilder::<T>::raw(sql)
            .select_optional(executor)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", self.entity)))
    }

    pub async fn restore_with<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<T, DatabaseError> {
        let sql = SqlResult {
            query: format!(
                "UPDATE \"{}\" SET \"deleted_at\" = NULL, \"updated_at\" = now() \
                 WHERE \"id\" = $1 AND \"deleted_at\" IS NOT NULL RETURNING *",
                self.table_name
            ),
            params: vec![SqlParam::from(id)],
        };
        QueryBuilder::<T>::raw(sql)
            .select_optional(executor)
            .await
            .map_err(|e| self.conflict_or(e))?
            .ok_or_else(|| DatabaseError::NotFound(format!("Deleted {} not found", self.entity.to_lowercase())))
    }

    fn conflict_or(&self, err: DatabaseError) -> DatabaseError {
        if err.is_unique_violation() {
            DatabaseError::Conflict(format!("{} already exists", self.entity))
        } else if err.is_foreign_key_violation() {
            DatabaseError::InvalidReference(format!("{} references a missing record", self.entity))
        } else {
            err
        }
    }
}

/// Execute a raw statement through the shared binder
pub async fn execute<'e, E: PgExecutor<'e>>(executor: E, sql: &SqlResult) -> Result<u64, DatabaseError> {
    query_builder::execute(executor, sql).await
}
