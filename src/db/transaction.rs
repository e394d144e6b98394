use crate::models::{Direction, Erc1155Entry, RawContract, Token, Transaction, WalletId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Returns the number of rows actually inserted; (hash, unique_id) duplicates are skipped.
pub async fn append_transactions(
    conn: &mut SqliteConnection,
    wallet_id: WalletId,
    transactions: &[Transaction],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;

    for transaction in transactions {
        let (token_id, token_entries) = match &transaction.token {
            Token::Fungible { token_id, .. } | Token::Erc721 { token_id, .. } => (Some(token_id.clone()), None),
            Token::Erc1155 { entries, .. } => (
                None,
                Some(serde_json::to_string(entries).map_err(|e| sqlx::Error::Encode(Box::new(e)))?),
            ),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO transactions
            (wallet_id, hash, unique_id, block_num, block_num_dec, from_address, to_address, value,
             asset, category, raw_contract_value, raw_contract_address, raw_contract_decimal,
             token_kind, token_contract, token_id, token_entries, block_timestamp, timestamp, direction)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(wallet_id, hash, unique_id) DO NOTHING
            "#
        )
        .bind(wallet_id)
        .bind(&transaction.hash)
        .bind(&transaction.unique_id)
        .bind(&transaction.block_num)
        .bind(transaction.block_num_dec)
        .bind(&transaction.from)
        .bind(&transaction.to)
        .bind(transaction.value)
        .bind(&transaction.asset)
        .bind(&transaction.category)
        .bind(&transaction.raw_contract.value)
        .bind(&transaction.raw_contract.address)
        .bind(transaction.raw_contract.decimal)
        .bind(transaction.token.kind())
        .bind(transaction.token.contract())
        .bind(token_id)
        .bind(token_entries)
        .bind(&transaction.block_timestamp)
        .bind(transaction.timestamp)
        .bind(transaction.direction.as_str())
        .execute(&mut *conn)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// All transactions of a wallet in insertion order
pub async fn get_transactions(
    conn: &mut SqliteConnection,
    wallet_id: WalletId,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT hash, unique_id, block_num, block_num_dec, from_address, to_address, value,
                  asset, category, raw_contract_value, raw_contract_address, raw_contract_decimal,
                  token_kind, token_contract, token_id, token_entries, block_timestamp, timestamp, direction
           FROM transactions
           WHERE wallet_id = ?
           ORDER BY rowid ASC"#
    )
    .bind(wallet_id)
    .fetch_all(conn)
    .await?;

    rows.iter().map(transaction_from_row).collect()
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    let direction: String = row.try_get("direction")?;
    let direction = Direction::parse(&direction).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "direction".to_string(),
        source: format!("unknown direction {}", direction).into(),
    })?;

    Ok(Transaction {
        block_num: row.try_get("block_num")?,
        block_num_dec: row.try_get("block_num_dec")?,
        unique_id: row.try_get("unique_id")?,
        hash: row.try_get("hash")?,
        from: row.try_get("from_address")?,
        to: row.try_get("to_address")?,
        value: row.try_get("value")?,
        asset: row.try_get("asset")?,
        category: row.try_get("category")?,
        raw_contract: RawContract {
            value: row.try_get("raw_contract_value")?,
            address: row.try_get("raw_contract_address")?,
            decimal: row.try_get("raw_contract_decimal")?,
        },
        token: token_from_row(row)?,
        block_timestamp: row.try_get("block_timestamp")?,
        timestamp: row.try_get("timestamp")?,
        direction,
    })
}

fn token_from_row(row: &SqliteRow) -> Result<Token, sqlx::Error> {
    let kind: String = row.try_get("token_kind")?;
    let contract: String = row.try_get("token_contract")?;
    let token_id: Option<String> = row.try_get("token_id")?;

    match kind.as_str() {
        "fungible" => Ok(Token::Fungible {
            contract,
            token_id: token_id.unwrap_or_default(),
        }),
        "erc721" => Ok(Token::Erc721 {
            contract,
            token_id: token_id.unwrap_or_default(),
        }),
        "erc1155" => {
            let raw: Option<String> = row.try_get("token_entries")?;
            let entries: Vec<Erc1155Entry> = match raw {
                Some(raw) => serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "token_entries".to_string(),
                    source: Box::new(e),
                })?,
                None => Vec::new(),
            };
            Ok(Token::Erc1155 { contract, entries })
        }
        other => Err(sqlx::Error::ColumnDecode {
            index: "token_kind".to_string(),
            source: format!("unknown token kind {}", other).into(),
        }),
    }
}
