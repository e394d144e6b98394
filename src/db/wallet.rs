use crate::models::WalletId;
use sqlx::{Row, SqliteConnection};

pub async fn get_wallet(conn: &mut SqliteConnection, address: &str) -> Result<Option<WalletId>, sqlx::Error> {
    let row = sqlx::query("SELECT id FROM wallets WHERE address = ?")
        .bind(address)
        .fetch_optional(conn)
        .await?;

    row.map(|row| row.try_get("id")).transpose()
}

/// Insert the wallet on first sight, otherwise just touch `updated_at`.
pub async fn ensure_wallet(conn: &mut SqliteConnection, address: &str) -> Result<WalletId, sqlx::Error> {
    let id = sqlx::query_scalar(
        "INSERT INTO wallets (address) VALUES (?)
         ON CONFLICT(address) DO UPDATE SET updated_at = strftime('%s', 'now')
         RETURNING id"
    )
    .bind(address)
    .fetch_one(conn)
    .await?;

    Ok(id)
}
