pub mod client;
pub mod http;
pub mod models;

// Re-exports for convenience
pub use client::{Credential, DataProvider, ProviderError};
pub use http::HttpProvider;
pub use models::{classify_token, normalize_transfer, parse_transfer, ClassifyError, RawTransfer};

use crate::config::Config;
use std::sync::Arc;
use tracing::info;

/// Build an HTTP client for every provider enabled in the configuration
pub fn build_providers(config: &Config) -> Result<Vec<Arc<dyn DataProvider>>, ProviderError> {
    let mut providers: Vec<Arc<dyn DataProvider>> = Vec::new();

    for (id, provider_config) in config.enabled_providers() {
        info!("Enabling {} at {}", id, provider_config.base_url);
        providers.push(Arc::new(HttpProvider::new(id, provider_config, config)?));
    }

    Ok(providers)
}
