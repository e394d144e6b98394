use crate::cache::{AddressBatch, CandidateAddress, SkipSet};
use crate::config::{Config, ProviderConfig};
use crate::models::ProviderId;
use crate::provider::client::{Credential, DataProvider, ProviderError};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct AuthRequest<'a> {
    api_key: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Deserialize)]
struct AddressesResponse {
    #[serde(default)]
    addresses: Vec<CandidateAddress>,
}

#[derive(Deserialize)]
struct TransfersResponse {
    #[serde(default)]
    transfers: Vec<serde_json::Value>,
}

/// JSON-over-HTTP provider: `POST /auth`, then bearer-authenticated
/// `GET /wallets/{wallet}/addresses` and `GET /wallets/{wallet}/transfers`.
pub struct HttpProvider {
    id: ProviderId,
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
    limiter: DefaultDirectRateLimiter,
    max_retries: usize,
}

impl HttpProvider {
    pub fn new(id: ProviderId, provider: &ProviderConfig, config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build http client: {}", e)))?;

        let per_second = NonZeroU32::new(config.provider_rate_limit).unwrap_or(NonZeroU32::MIN);

        info!(
            "Initializing {} with endpoint: {}, rate limit: {}/s",
            id, provider.base_url, per_second
        );

        Ok(Self {
            id,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            api_key: provider.api_key.clone(),
            http,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            max_retries: config.provider_max_retries,
        })
    }

    fn url(&self, path: &str) -> Result<String, ProviderError> {
        if self.base_url.is_empty() {
            return Err(ProviderError::Unavailable(format!("no endpoint configured for {}", self.id)));
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.max_retries)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, credential: &Credential) -> Result<T, ProviderError> {
        let url = self.url(path)?;
        let url = url.as_str();
        let token = credential.token.as_str();

        let fetch = move || async move {
            self.limiter.until_ready().await;
            let response = self
                .http
                .get(url)
                .bearer_auth(token)
                .send()
                .await
                .map_err(map_transport_error)?;
            decode_response::<T>(response).await
        };

        fetch
            .retry(self.backoff())
            .when(ProviderError::is_transient)
            .notify(|err, delay| warn!("{} request to {} failed: {}, retrying in {:?}", self.id, url, err, delay))
            .await
    }
}

#[async_trait]
impl DataProvider for HttpProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn authenticate(&self) -> Result<Credential, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Auth(format!("no api key configured for {}", self.id)))?;
        let url = self.url("/auth")?;
        let url = url.as_str();

        let login = move || async move {
            self.limiter.until_ready().await;
            let response = self
                .http
                .post(url)
                .json(&AuthRequest { api_key })
                .send()
                .await
                .map_err(map_transport_error)?;
            decode_response::<AuthResponse>(response).await
        };

        let auth = login
            .retry(self.backoff())
            .when(ProviderError::is_transient)
            .await?;

        debug!("{} authenticated", self.id);
        Ok(Credential { token: auth.token })
    }

    async fn fetch_addresses(
        &self,
        credential: &Credential,
        wallet: &str,
        skip_set: &SkipSet,
    ) -> Result<AddressBatch, ProviderError> {
        let response: AddressesResponse = self
            .get_json(&format!("/wallets/{}/addresses", wallet), credential)
            .await?;

        let batch = skip_set.partition(response.addresses);
        debug!(
            "{} returned {} addresses for {} ({} new, {} skipped)",
            self.id,
            batch.total,
            wallet,
            batch.addresses.len(),
            batch.skipped
        );
        Ok(batch)
    }

    async fn fetch_transfers(
        &self,
        credential: &Credential,
        wallet: &str,
    ) -> Result<Vec<serde_json::Value>, ProviderError> {
        let response: TransfersResponse = self
            .get_json(&format!("/wallets/{}/transfers", wallet), credential)
            .await?;

        debug!("{} returned {} transfers for {}", self.id, response.transfers.len(), wallet);
        Ok(response.transfers)
    }
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    match err.status() {
        Some(status) => error_for_status(status, &err.to_string()),
        None => ProviderError::Unavailable(err.to_string()),
    }
}

pub(crate) fn error_for_status(status: StatusCode, detail: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(format!("{}: {}", status, detail)),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(format!("{}: {}", status, detail)),
        _ => ProviderError::Unavailable(format!("{}: {}", status, detail)),
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_for_status(status, &body));
    }

    // A body cut off mid-read is an outage; one that arrives but does not
    // decode will not get better on retry.
    let body = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice(&body).map_err(|e| ProviderError::Malformed(format!("invalid response body: {}", e)))
}
