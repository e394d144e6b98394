pub mod keys;
pub mod skip_set;
pub mod snapshot;

pub use keys::CacheKey;
pub use skip_set::{AddressBatch, CandidateAddress, SkipSet};
pub use snapshot::SnapshotCache;

use crate::config::Config;

pub fn init_cache(config: &Config) -> SnapshotCache {
    SnapshotCache::new(config.cache_max_capacity, config.cache_ttl)
}
