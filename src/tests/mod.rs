mod http_provider_tests;

use crate::cache::{AddressBatch, CandidateAddress, SkipSet};
use crate::config::Config;
use crate::models::ProviderId;
use crate::provider::{Credential, DataProvider, ProviderError};
use crate::state::AppState;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory store with the given provider enable map
pub(crate) async fn setup(enabled: &[ProviderId]) -> Arc<AppState> {
    setup_with(enabled, |_| {}).await
}

pub(crate) async fn setup_with(enabled: &[ProviderId], tweak: impl FnOnce(&mut Config)) -> Arc<AppState> {
    let mut config = Config::default();
    for (id, provider) in config.providers.iter_mut() {
        provider.enabled = enabled.contains(id);
    }
    tweak(&mut config);

    Arc::new(AppState::connect(config).await.expect("Failed to open test database"))
}

/// File-backed store under `dir`, for tests that need real concurrent connections
pub(crate) async fn setup_file(enabled: &[ProviderId], dir: &tempfile::TempDir) -> Arc<AppState> {
    let path = dir.path().join("wallets.db");
    setup_with(enabled, |config| {
        config.database_url = format!("sqlite:{}", path.display());
    })
    .await
}

pub(crate) fn candidate(address: &str, has_content: bool) -> CandidateAddress {
    CandidateAddress {
        address: address.to_string(),
        has_content,
    }
}

pub(crate) fn transfer(unique_id: &str, from: &str, to: &str, extra: serde_json::Value) -> serde_json::Value {
    let mut value = serde_json::json!({
        "blockNum": "0x10",
        "uniqueId": unique_id,
        "hash": format!("0xhash-{}", unique_id),
        "from": from,
        "to": to,
        "value": 1.5,
        "asset": "ETH",
        "category": "external",
        "tokenId": "",
        "rawContract": { "value": "0x1", "address": null, "decimal": 18 },
        "metadata": { "blockTimestamp": "2023-12-11T00:00:00.000Z" }
    });
    if let (Some(target), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    value
}

/// Scripted provider used by the aggregation tests
pub(crate) struct MockProvider {
    id: ProviderId,
    addresses: Vec<CandidateAddress>,
    transfers: Vec<serde_json::Value>,
    failure: Option<ProviderError>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            addresses: Vec::new(),
            transfers: Vec::new(),
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_addresses(mut self, addresses: Vec<CandidateAddress>) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn with_transfers(mut self, transfers: Vec<serde_json::Value>) -> Self {
        self.transfers = transfers;
        self
    }

    pub fn failing(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<dyn DataProvider> {
        Arc::new(self)
    }
}

#[async_trait]
impl DataProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn authenticate(&self) -> Result<Credential, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(ProviderError::Auth(msg)) => Err(ProviderError::Auth(msg.clone())),
            _ => Ok(Credential {
                token: format!("token-{}", self.id.as_str()),
            }),
        }
    }

    async fn fetch_addresses(
        &self,
        _credential: &Credential,
        _wallet: &str,
        skip_set: &SkipSet,
    ) -> Result<AddressBatch, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(skip_set.partition(self.addresses.clone()))
    }

    async fn fetch_transfers(
        &self,
        _credential: &Credential,
        _wallet: &str,
    ) -> Result<Vec<serde_json::Value>, ProviderError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.transfers.clone())
    }
}
