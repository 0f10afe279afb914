// src/db.rs - Database setup and migrations

use std::time::Duration;

use anyhow::Result;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use std::str::FromStr;

use crate::config::DatabaseConfig;

pub async fn setup_database(database_url: &str) -> Result<()> {
    if database_url.contains(":memory:") {
        return Ok(());
    }
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        log::info!("Creating database: {}", database_url);
        Sqlite::create_database(database_url).await?;
    }
    Ok(())
}

pub async fn create_database_pool(db_config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&db_config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .idle_timeout(Duration::from_secs(db_config.idle_timeout))
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS medications (
            medication_id INTEGER PRIMARY KEY AUTOINCREMENT,
            medication_name TEXT NOT NULL CHECK(length(medication_name) > 0 AND length(medication_name) <= 255),
            generic_name TEXT NOT NULL DEFAULT '' CHECK(length(generic_name) <= 255),
            medication_type TEXT NOT NULL CHECK(length(medication_type) > 0 AND length(medication_type) <= 100),
            manufacturer TEXT NOT NULL DEFAULT '' CHECK(length(manufacturer) <= 255),
            strength TEXT NOT NULL DEFAULT '' CHECK(length(strength) <= 100),
            expiry_date DATE NOT NULL,
            purchase_date DATE,
            quantity_remaining INTEGER NOT NULL CHECK(quantity_remaining >= 0),
            price REAL CHECK(price IS NULL OR price >= 0),
            prescription_required INTEGER NOT NULL DEFAULT 0 CHECK(prescription_required IN (0, 1)),
            storage_instructions TEXT NOT NULL DEFAULT '' CHECK(length(storage_instructions) <= 1000),
            side_effects TEXT NOT NULL DEFAULT '' CHECK(length(side_effects) <= 1000)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Alert views filter and sort on these two columns
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_medications_expiry ON medications(expiry_date)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_medications_quantity ON medications(quantity_remaining)")
        .execute(pool)
        .await?;

    log::info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    // One connection only: every new connection to :memory: is a fresh database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool");

    run_migrations(&pool).await.expect("migrations");
    pool
}
