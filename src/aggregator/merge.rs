//! Merging provider results into a wallet snapshot

use crate::cache::CandidateAddress;
use crate::models::{ProviderId, SavedData, StoredAddress, Transaction};
use crate::provider::models::{normalize_transfer, parse_transfer};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Accumulates what a run discovered on top of the loaded snapshot.
/// Addresses are keyed per source and transactions by (hash, unique_id), so
/// the order providers finish in does not change the outcome.
pub struct MergeState {
    wallet: String,
    known_addresses: BTreeMap<ProviderId, HashSet<String>>,
    known_transactions: HashSet<(String, String)>,
    pub new_addresses: BTreeMap<ProviderId, Vec<StoredAddress>>,
    pub new_transactions: Vec<Transaction>,
    pub dropped_transactions: usize,
}

impl MergeState {
    pub fn new(snapshot: &SavedData) -> Self {
        let known_addresses = ProviderId::ALL
            .iter()
            .map(|id| {
                let known = snapshot
                    .addresses_for(*id)
                    .iter()
                    .map(|a| a.address.to_ascii_lowercase())
                    .collect();
                (*id, known)
            })
            .collect();

        Self {
            wallet: snapshot.wallet_address.clone(),
            known_addresses,
            known_transactions: snapshot.transactions.iter().map(Transaction::key).collect(),
            new_addresses: BTreeMap::new(),
            new_transactions: Vec::new(),
            dropped_transactions: 0,
        }
    }

    /// Union candidates into `source`, stamping them with `created_at`.
    /// Returns the addresses that were actually new.
    pub fn add_addresses(
        &mut self,
        source: ProviderId,
        candidates: Vec<CandidateAddress>,
        created_at: &str,
    ) -> Vec<StoredAddress> {
        let known = self.known_addresses.entry(source).or_default();
        let mut accepted = Vec::new();

        for candidate in candidates {
            let address = candidate.address.trim().to_ascii_lowercase();
            if address.is_empty() || !known.insert(address.clone()) {
                continue;
            }
            accepted.push(StoredAddress {
                address,
                has_content: candidate.has_content,
                created_at: created_at.to_string(),
            });
        }

        self.new_addresses
            .entry(source)
            .or_default()
            .extend(accepted.iter().cloned());
        accepted
    }

    /// Decode, classify and dedup transfers; malformed or unrelated ones are dropped.
    /// Returns how many new transactions this call contributed.
    pub fn add_transfers(&mut self, source: ProviderId, transfers: Vec<serde_json::Value>) -> usize {
        let mut added = 0;

        for record in transfers {
            let parsed = parse_transfer(record).and_then(|raw| normalize_transfer(&raw, &self.wallet));
            let transaction = match parsed {
                Ok(transaction) => transaction,
                Err(e) => {
                    warn!("Dropping transfer from {}: {}", source, e);
                    self.dropped_transactions += 1;
                    continue;
                }
            };

            if self.known_transactions.insert(transaction.key()) {
                self.new_transactions.push(transaction);
                added += 1;
            }
        }

        added
    }

    pub fn has_changes(&self) -> bool {
        !self.new_transactions.is_empty() || self.new_addresses.values().any(|v| !v.is_empty())
    }
}
