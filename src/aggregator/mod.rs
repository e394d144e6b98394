//! Concurrent fan-out to the configured providers for one wallet

pub mod merge;

pub use merge::MergeState;

use crate::cache::{AddressBatch, SkipSet};
use crate::db::StoreSession;
use crate::models::{AggregateOutcome, AggregationResult, ProviderId, ProviderReport, ProviderStatus};
use crate::provider::{DataProvider, ProviderError};
use crate::state::AppState;
use crate::validation::normalize_wallet_address;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

enum ProviderOutcome {
    Completed { batch: AddressBatch, transfers: Vec<serde_json::Value> },
    Failed(ProviderError),
    Cancelled,
}

pub struct Aggregator {
    state: Arc<AppState>,
    providers: Vec<Arc<dyn DataProvider>>,
}

impl Aggregator {
    pub fn new(state: Arc<AppState>, providers: Vec<Arc<dyn DataProvider>>) -> Self {
        Self { state, providers }
    }

    /// Providers that are both registered and switched on, one per source
    fn enabled_providers(&self) -> BTreeMap<ProviderId, Arc<dyn DataProvider>> {
        let mut enabled = BTreeMap::new();
        for provider in &self.providers {
            let id = provider.id();
            if !self.state.config.is_enabled(id) {
                continue;
            }
            if enabled.insert(id, provider.clone()).is_some() {
                warn!("Multiple clients registered for {}, using the last one", id);
            }
        }
        enabled
    }

    /// Fetch, merge and persist everything the enabled providers know about
    /// `wallet_address`.
    ///
    /// Provider failures and malformed transfers end up in the returned
    /// [`AggregationResult`]; only storage errors fail the call. When `cancel`
    /// fires or the configured deadline passes, providers still running are
    /// reported as cancelled and whatever already completed is merged.
    pub async fn aggregate(
        &self,
        wallet_address: &str,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome, AggregateError> {
        let wallet = normalize_wallet_address(wallet_address);
        let deadline = Instant::now() + self.state.config.aggregate_timeout;
        info!("Aggregating wallet {}", wallet);

        // The skip-sets come from a short read; no connection is held while
        // providers are in flight.
        let snapshot = {
            let mut session = StoreSession::begin(&self.state.db_pool).await?;
            let snapshot = session.load_saved_data(&wallet).await?;
            session.commit().await?;
            snapshot
        };
        let skip_sets = SkipSet::for_snapshot(&snapshot);

        let enabled = self.enabled_providers();
        let tasks = enabled.iter().map(|(id, provider)| {
            let skip_set = skip_sets.get(id).cloned().unwrap_or_default();
            let wallet = wallet.as_str();
            async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => ProviderOutcome::Cancelled,
                    _ = sleep_until(deadline) => ProviderOutcome::Cancelled,
                    result = fetch_from_provider(provider.as_ref(), wallet, &skip_set) => match result {
                        Ok((batch, transfers)) => ProviderOutcome::Completed { batch, transfers },
                        Err(e) => ProviderOutcome::Failed(e),
                    },
                };
                (*id, outcome)
            }
        });
        let outcomes = join_all(tasks).await;

        // Another run may have written this wallet while providers were in
        // flight, so merge against what is stored now, under the write lock.
        let mut session = StoreSession::begin_write(&self.state.db_pool).await?;
        let current = session.load_saved_data(&wallet).await?;

        let created_at = chrono::Utc::now().to_rfc3339();
        let mut merge = MergeState::new(&current);
        let mut reports: BTreeMap<ProviderId, ProviderReport> = ProviderId::ALL
            .iter()
            .map(|id| (*id, ProviderReport::with_status(ProviderStatus::Disabled)))
            .collect();
        let mut cancelled = false;

        for (id, outcome) in outcomes {
            let report = match outcome {
                ProviderOutcome::Completed { batch, transfers } => {
                    let new_addresses = merge.add_addresses(id, batch.addresses, &created_at);
                    let new_transactions = merge.add_transfers(id, transfers);
                    debug!(
                        "{}: {} new addresses ({} total, {} skipped), {} new transactions",
                        id,
                        new_addresses.len(),
                        batch.total,
                        batch.skipped,
                        new_transactions
                    );
                    ProviderReport {
                        status: ProviderStatus::Succeeded,
                        new_addresses,
                        total: batch.total,
                        skipped: batch.skipped,
                        new_transactions,
                    }
                }
                ProviderOutcome::Failed(e) => {
                    warn!("{} failed for wallet {}: {}", id, wallet, e);
                    ProviderReport::with_status(ProviderStatus::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    })
                }
                ProviderOutcome::Cancelled => {
                    warn!("{} cancelled for wallet {}", id, wallet);
                    cancelled = true;
                    ProviderReport::with_status(ProviderStatus::Cancelled)
                }
            };
            reports.insert(id, report);
        }

        let wallet_id = session.ensure_wallet(&wallet).await?;
        if merge.has_changes() {
            for (source, addresses) in &merge.new_addresses {
                session.upsert_addresses(wallet_id, *source, addresses).await?;
            }
            session.append_transactions(wallet_id, &merge.new_transactions).await?;
        }
        let data = session.get_saved_data(wallet_id, &wallet).await?;
        session.commit().await?;

        self.state.cache.insert(data.clone()).await;

        info!(
            "Aggregated wallet {}: {} transactions, {} dropped{}",
            wallet,
            data.transactions.len(),
            merge.dropped_transactions,
            if cancelled { " (cancelled)" } else { "" }
        );

        Ok(AggregateOutcome {
            data,
            result: AggregationResult {
                providers: reports,
                dropped_transactions: merge.dropped_transactions,
                cancelled,
            },
        })
    }
}

async fn fetch_from_provider(
    provider: &dyn DataProvider,
    wallet: &str,
    skip_set: &SkipSet,
) -> Result<(AddressBatch, Vec<serde_json::Value>), ProviderError> {
    let credential = provider.authenticate().await?;
    tokio::try_join!(
        provider.fetch_addresses(&credential, wallet, skip_set),
        provider.fetch_transfers(&credential, wallet),
    )
}
