//! Cache key generation and management

use std::fmt;

/// A structured cache key that can be converted to a string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Full snapshot of a wallet
    Snapshot(String),
}

impl CacheKey {
    pub fn snapshot(wallet: &str) -> Self {
        Self::Snapshot(wallet.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(wallet) => write!(f, "snapshot:{}", wallet),
        }
    }
}
