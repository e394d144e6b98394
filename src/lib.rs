pub mod aggregator;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod provider;
pub mod service;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use aggregator::{AggregateError, Aggregator};
pub use config::Config;
pub use models::{AggregateOutcome, AggregationResult, SavedData};
pub use provider::{DataProvider, ProviderError};
pub use state::AppState;
pub use service::ServiceError;
pub use validation::{normalize_wallet_address, validate_wallet_address, ValidationError};
