use crate::cache::{AddressBatch, SkipSet};
use crate::models::ProviderId;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_error",
            Self::Unavailable(_) => "provider_unavailable",
            Self::RateLimited(_) => "rate_limited",
            Self::Malformed(_) => "malformed_response",
        }
    }

    /// Only outages are worth another attempt. Auth, quota and decode errors
    /// come back the same on every try.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Session token handed out by a provider's auth endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("token", &"<redacted>").finish()
    }
}

/// One external source of wallet addresses and transfers
#[async_trait]
pub trait DataProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn authenticate(&self) -> Result<Credential, ProviderError>;

    /// Addresses related to `wallet` that are not in `skip_set`.
    /// Known addresses are only counted, never returned.
    async fn fetch_addresses(
        &self,
        credential: &Credential,
        wallet: &str,
        skip_set: &SkipSet,
    ) -> Result<AddressBatch, ProviderError>;

    /// Transfer records as the provider sent them. Records are decoded one at
    /// a time later on, so a single bad record cannot sink the whole batch.
    async fn fetch_transfers(
        &self,
        _credential: &Credential,
        _wallet: &str,
    ) -> Result<Vec<serde_json::Value>, ProviderError> {
        Ok(Vec::new())
    }
}
