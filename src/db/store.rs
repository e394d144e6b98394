//! Storage session scoped to a single aggregation run

use crate::db::{address, transaction, wallet};
use crate::models::{ProviderId, SavedData, StoredAddress, Transaction, WalletId};
use sqlx::{Pool, Sqlite};
use tracing::debug;

/// Wraps one database transaction. Dropping it without calling
/// [`StoreSession::commit`] rolls back and releases the connection.
pub struct StoreSession {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl StoreSession {
    /// Deferred transaction, for reads
    pub async fn begin(pool: &Pool<Sqlite>) -> Result<Self, sqlx::Error> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }

    /// Takes the write lock up front. A deferred transaction that reads and
    /// later writes fails with SQLITE_BUSY_SNAPSHOT if another writer
    /// committed in between; an immediate one waits on the busy timeout.
    pub async fn begin_write(pool: &Pool<Sqlite>) -> Result<Self, sqlx::Error> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Self { tx })
    }

    pub async fn get_wallet(&mut self, address: &str) -> Result<Option<WalletId>, sqlx::Error> {
        wallet::get_wallet(&mut self.tx, address).await
    }

    pub async fn ensure_wallet(&mut self, address: &str) -> Result<WalletId, sqlx::Error> {
        wallet::ensure_wallet(&mut self.tx, address).await
    }

    pub async fn get_saved_data(&mut self, wallet_id: WalletId, wallet_address: &str) -> Result<SavedData, sqlx::Error> {
        let mut data = SavedData::empty(wallet_address);
        data.transactions = transaction::get_transactions(&mut self.tx, wallet_id).await?;

        for source in ProviderId::ALL {
            let stored = address::get_addresses(&mut self.tx, wallet_id, source).await?;
            data.addresses.insert(source, stored);
        }

        Ok(data)
    }

    /// Snapshot for an address; an unknown wallet yields the empty snapshot.
    pub async fn load_saved_data(&mut self, wallet_address: &str) -> Result<SavedData, sqlx::Error> {
        match self.get_wallet(wallet_address).await? {
            Some(wallet_id) => self.get_saved_data(wallet_id, wallet_address).await,
            None => {
                debug!("No stored wallet for {}", wallet_address);
                Ok(SavedData::empty(wallet_address))
            }
        }
    }

    pub async fn upsert_addresses(
        &mut self,
        wallet_id: WalletId,
        source: ProviderId,
        addresses: &[StoredAddress],
    ) -> Result<u64, sqlx::Error> {
        address::upsert_addresses(&mut self.tx, wallet_id, source, addresses).await
    }

    pub async fn append_transactions(&mut self, wallet_id: WalletId, txs: &[Transaction]) -> Result<u64, sqlx::Error> {
        transaction::append_transactions(&mut self.tx, wallet_id, txs).await
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}
