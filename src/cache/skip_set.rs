//! Per-source view of the addresses a wallet already has

use crate::models::{ProviderId, SavedData, StoredAddress};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// What a provider call returns after the skip filter was applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBatch {
    pub addresses: Vec<CandidateAddress>,
    pub total: usize,
    pub skipped: usize,
}

/// An address reported by a provider, before it is stamped and stored
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CandidateAddress {
    pub address: String,
    #[serde(default)]
    pub has_content: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SkipSet {
    known: HashSet<String>,
}

impl SkipSet {
    pub fn from_addresses(addresses: &[StoredAddress]) -> Self {
        Self {
            known: addresses.iter().map(|a| a.address.to_ascii_lowercase()).collect(),
        }
    }

    /// One skip-set per source, built once per run and shared read-only
    pub fn for_snapshot(data: &SavedData) -> BTreeMap<ProviderId, Arc<SkipSet>> {
        ProviderId::ALL
            .iter()
            .map(|id| (*id, Arc::new(Self::from_addresses(data.addresses_for(*id)))))
            .collect()
    }

    /// Split provider candidates into new addresses and a skipped count.
    /// Every candidate counts toward `total`; repeats within the batch are skipped.
    pub fn partition(&self, candidates: Vec<CandidateAddress>) -> AddressBatch {
        let total = candidates.len();
        let mut seen = HashSet::new();
        let mut addresses = Vec::new();

        for mut candidate in candidates {
            candidate.address = candidate.address.trim().to_ascii_lowercase();
            if self.known.contains(&candidate.address) || !seen.insert(candidate.address.clone()) {
                continue;
            }
            addresses.push(candidate);
        }

        AddressBatch {
            skipped: total - addresses.len(),
            addresses,
            total,
        }
    }
}
