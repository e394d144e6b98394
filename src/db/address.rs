use crate::models::{ProviderId, StoredAddress, WalletId};
use sqlx::{Row, SqliteConnection};

pub async fn get_addresses(
    conn: &mut SqliteConnection,
    wallet_id: WalletId,
    source: ProviderId,
) -> Result<Vec<StoredAddress>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT address, has_content, created_at FROM stored_addresses
         WHERE wallet_id = ? AND source = ?
         ORDER BY rowid ASC"
    )
    .bind(wallet_id)
    .bind(source.as_str())
    .fetch_all(conn)
    .await?;

    rows.iter()
        .map(|row| -> Result<StoredAddress, sqlx::Error> {
            Ok(StoredAddress {
                address: row.try_get("address")?,
                has_content: row.try_get("has_content")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

/// Returns the number of rows actually inserted; known addresses are left untouched.
pub async fn upsert_addresses(
    conn: &mut SqliteConnection,
    wallet_id: WalletId,
    source: ProviderId,
    addresses: &[StoredAddress],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;

    for address in addresses {
        let result = sqlx::query(
            "INSERT INTO stored_addresses (wallet_id, source, address, has_content, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(wallet_id, source, address) DO NOTHING"
        )
        .bind(wallet_id)
        .bind(source.as_str())
        .bind(&address.address)
        .bind(address.has_content)
        .bind(&address.created_at)
        .execute(&mut *conn)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}
