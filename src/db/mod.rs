mod models;
mod seeders;

pub use models::*;
pub use seeders::seed_pricing_plans;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("atelier.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Open a private in-memory database with the full schema applied.
///
/// A single connection is used so every query sees the same database.
pub async fn init_memory() -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    // Seed the default pricing tiers on a fresh database
    seeders::seed_pricing_plans(pool).await?;

    info!("Migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_has_full_schema() {
        let pool = init_memory().await.unwrap();
        for table in ["projects", "blogs", "pricing_plans", "orders", "messages", "settings"] {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
                    .bind(table)
                    .fetch_optional(&pool)
                    .await
                    .unwrap();
            assert!(found.is_some(), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_reopening_database_keeps_data() {
        let dir = tempfile::tempdir().unwrap();

        let pool = init(dir.path()).await.unwrap();
        let (plans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pricing_plans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(plans, 3);
        sqlx::query("INSERT INTO settings (key, value, updated_at) VALUES ('site', '{}', 'now')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = init(dir.path()).await.unwrap();
        let (plans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pricing_plans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(plans, 3);
        let (settings,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(settings, 1);
    }
}
