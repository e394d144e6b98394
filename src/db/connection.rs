// SQLite connection pool plus schema initialization

use crate::db::migration;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub async fn establish_connection(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    // In-memory databases are per-connection, so they get a single shared one
    if database_url.contains(":memory:") {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect(database_url)
            .await?;
        migration::run_migrations(&pool).await?;
        return Ok(pool);
    }

    // Create database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url).await?;
    }

    // Concurrent runs queue on the write lock instead of failing fast
    let options = SqliteConnectOptions::from_str(database_url)?.busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    migration::run_migrations(&pool).await?;

    Ok(pool)
}
