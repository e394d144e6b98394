// Configuration is read once at startup from the environment (and .env):
// - Database connection string
// - Snapshot cache settings (size, TTL)
// - Aggregation deadline
// - Provider enable map, endpoints and secrets
// - Provider request timeout, rate limit and retry budget

use crate::models::ProviderId;
use dotenv::dotenv;
use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,
    pub aggregate_timeout: Duration,
    pub provider_timeout: Duration,
    pub provider_rate_limit: u32,
    pub provider_max_retries: usize,
    pub providers: BTreeMap<ProviderId, ProviderConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:wallets.db".to_string());
        let cache_ttl = env::var("CACHE_TTL")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));
        let cache_max_capacity = env::var("CACHE_MAX_CAPACITY")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .unwrap_or(1000);
        let aggregate_timeout = env::var("AGGREGATE_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(30))
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let provider_timeout = env::var("PROVIDER_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(10))
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let provider_rate_limit = env::var("PROVIDER_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(5);
        let provider_max_retries = env::var("PROVIDER_MAX_RETRIES")
            .map(|v| v.parse().unwrap_or(2))
            .unwrap_or(2);

        let providers = ProviderId::ALL
            .iter()
            .map(|id| (*id, provider_from_env(*id)))
            .collect();

        Self {
            database_url,
            cache_ttl,
            cache_max_capacity,
            aggregate_timeout,
            provider_timeout,
            provider_rate_limit,
            provider_max_retries,
            providers,
        }
    }

    pub fn is_enabled(&self, id: ProviderId) -> bool {
        self.providers.get(&id).is_some_and(|p| p.enabled)
    }

    pub fn enabled_providers(&self) -> impl Iterator<Item = (ProviderId, &ProviderConfig)> {
        self.providers
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(id, p)| (*id, p))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            cache_ttl: Duration::from_secs(60),
            cache_max_capacity: 1000,
            aggregate_timeout: Duration::from_secs(30),
            provider_timeout: Duration::from_secs(10),
            provider_rate_limit: 5,
            provider_max_retries: 2,
            providers: ProviderId::ALL
                .iter()
                .map(|id| {
                    (
                        *id,
                        ProviderConfig {
                            enabled: default_enabled(*id),
                            base_url: String::new(),
                            api_key: None,
                        },
                    )
                })
                .collect(),
        }
    }
}

fn default_enabled(id: ProviderId) -> bool {
    matches!(id, ProviderId::One | ProviderId::Three)
}

fn provider_from_env(id: ProviderId) -> ProviderConfig {
    let n = id.as_str();
    let enabled = env::var(format!("PROVIDER_{}_ENABLED", n))
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or_else(|| default_enabled(id));
    let base_url = env::var(format!("PROVIDER_{}_URL", n)).unwrap_or_default();
    let api_key = env::var(format!("PROVIDER_{}_API_KEY", n))
        .ok()
        .filter(|key| !key.trim().is_empty());

    ProviderConfig {
        enabled,
        base_url,
        api_key,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
