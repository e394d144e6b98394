// Read path for stored wallet data: cache first, then a short-lived store session.

use crate::db::StoreSession;
use crate::models::SavedData;
use crate::state::AppState;
use crate::validation::{normalize_wallet_address, validate_wallet_address, ValidationError};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Current snapshot for a wallet. An unknown wallet is not an error; it yields
/// the empty snapshot. Addresses that are not 20-byte hex are rejected before
/// the cache or the store is touched.
pub async fn fetch_saved_data(state: &AppState, wallet_address: &str) -> Result<SavedData, ServiceError> {
    validate_wallet_address(wallet_address)?;
    let wallet = normalize_wallet_address(wallet_address);

    if let Some(cached) = state.cache.get(&wallet).await {
        return Ok(cached);
    }

    let mut session = StoreSession::begin(&state.db_pool).await?;
    let data = session.load_saved_data(&wallet).await?;
    session.commit().await?;

    debug!("Loaded snapshot for {} from store", wallet);
    state.cache.insert(data.clone()).await;
    Ok(data)
}

/// Same as [`fetch_saved_data`] but never fails: errors are logged and the
/// empty snapshot is returned.
pub async fn fetch_saved_data_or_empty(state: &AppState, wallet_address: &str) -> SavedData {
    match fetch_saved_data(state, wallet_address).await {
        Ok(data) => data,
        Err(e) => {
            error!("db:fetch (wallet: {}) :: fetch_saved_data error: {}", wallet_address, e);
            SavedData::empty(&normalize_wallet_address(wallet_address))
        }
    }
}
