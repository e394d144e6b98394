use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS wallets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS stored_addresses (
            wallet_id INTEGER NOT NULL,
            source TEXT NOT NULL,
            address TEXT NOT NULL,
            has_content BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE (wallet_id, source, address),
            FOREIGN KEY (wallet_id) REFERENCES wallets(id)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            wallet_id INTEGER NOT NULL,
            hash TEXT NOT NULL,
            unique_id TEXT NOT NULL,
            block_num TEXT NOT NULL,
            block_num_dec INTEGER NOT NULL,
            from_address TEXT NOT NULL,
            to_address TEXT,
            value REAL,
            asset TEXT,
            category TEXT NOT NULL,
            raw_contract_value TEXT,
            raw_contract_address TEXT,
            raw_contract_decimal INTEGER,
            token_kind TEXT NOT NULL,
            token_contract TEXT NOT NULL,
            token_id TEXT,
            token_entries TEXT,
            block_timestamp TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            direction TEXT NOT NULL,
            UNIQUE (wallet_id, hash, unique_id),
            FOREIGN KEY (wallet_id) REFERENCES wallets(id)
        )"
    )
    .execute(pool)
    .await?;

    // Add indexes for common queries
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_stored_addresses_wallet_source
         ON stored_addresses(wallet_id, source)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_wallet
         ON transactions(wallet_id)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
