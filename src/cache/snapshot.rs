//! Snapshot cache implementation using Moka

use super::keys::CacheKey;
use crate::models::SavedData;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// Caches wallet snapshots for the read path
#[derive(Clone)]
pub struct SnapshotCache {
    cache: Cache<CacheKey, SavedData>,
}

impl SnapshotCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, wallet: &str) -> Option<SavedData> {
        let key = CacheKey::snapshot(wallet);
        let result = self.cache.get(&key).await;
        if result.is_some() {
            debug!("Cache hit for key: {}", key);
        } else {
            debug!("Cache miss for key: {}", key);
        }
        result
    }

    pub async fn insert(&self, data: SavedData) {
        let key = CacheKey::snapshot(&data.wallet_address);
        debug!("Caching snapshot under key: {}", key);
        self.cache.insert(key, data).await;
    }
}
