// src/repositories/mod.rs
//! Data-access layer. Every method borrows a pooled connection for the
//! duration of one statement (or one transaction) and hands it back on return.

pub mod medication;

pub use medication::MedicationRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use crate::error::ApiResult;

/// Basic CRUD over a table with an integer surrogate key.
#[async_trait]
pub trait CrudRepository<T, Record>: Send + Sync
where
    T: Send + Unpin + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow>,
    Record: Send + Sync,
{
    fn table_name(&self) -> &'static str;

    fn id_field(&self) -> &'static str {
        "id"
    }

    /// Column used by `list_all`
    fn default_sort_field(&self) -> &'static str;

    /// Inserts a row and returns the generated key.
    async fn create(&self, pool: &SqlitePool, data: &Record) -> ApiResult<i64>;

    /// Overwrites every column of the row. `false` when no row has that id.
    async fn update(&self, pool: &SqlitePool, id: i64, data: &Record) -> ApiResult<bool>;

    async fn get_by_id(&self, pool: &SqlitePool, id: i64) -> ApiResult<Option<T>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?",
            self.table_name(),
            self.id_field()
        );

        let result = sqlx::query_as::<_, T>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(result)
    }

    async fn list_all(&self, pool: &SqlitePool) -> ApiResult<Vec<T>> {
        let query = format!(
            "SELECT * FROM {} ORDER BY {} ASC, {} ASC",
            self.table_name(),
            self.default_sort_field(),
            self.id_field()
        );

        let rows = sqlx::query_as::<_, T>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }

    /// `false` when no row has that id.
    async fn delete(&self, pool: &SqlitePool, id: i64) -> ApiResult<bool> {
        let query = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table_name(),
            self.id_field()
        );

        let mut tx = pool.begin().await?;
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, pool: &SqlitePool) -> ApiResult<i64> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table_name());
        let total: i64 = sqlx::query_scalar(&query).fetch_one(pool).await?;
        Ok(total)
    }
}
