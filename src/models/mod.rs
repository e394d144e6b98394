// Domain types shared by the store, the providers and the aggregator.
// Everything here is plain data; classification and merging live elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder used when a caller hands us an empty wallet address.
pub const UNRESOLVED_WALLET: &str = "n/a";

/// Row id of a wallet in the store
pub type WalletId = i64;

/// One of the data sources a wallet's addresses are collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider-{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
    InAndOut,
}

impl Direction {
    /// Derive the direction of a transfer relative to `wallet`.
    /// Returns `None` when neither side of the transfer is the wallet.
    pub fn for_wallet(from: &str, to: Option<&str>, wallet: &str) -> Option<Self> {
        let outgoing = from.eq_ignore_ascii_case(wallet);
        let incoming = to.is_some_and(|to| to.eq_ignore_ascii_case(wallet));

        match (incoming, outgoing) {
            (true, true) => Some(Self::InAndOut),
            (true, false) => Some(Self::Incoming),
            (false, true) => Some(Self::Outgoing),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
            Self::InAndOut => "in_and_out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "incoming" => Some(Self::Incoming),
            "outgoing" => Some(Self::Outgoing),
            "in_and_out" => Some(Self::InAndOut),
            _ => None,
        }
    }
}

/// A single (token id, amount) pair carried by an ERC-1155 transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc1155Entry {
    pub token_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Token {
    Fungible { contract: String, token_id: String },
    Erc721 { contract: String, token_id: String },
    Erc1155 { contract: String, entries: Vec<Erc1155Entry> },
}

impl Token {
    pub fn contract(&self) -> &str {
        match self {
            Self::Fungible { contract, .. }
            | Self::Erc721 { contract, .. }
            | Self::Erc1155 { contract, .. } => contract,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fungible { .. } => "fungible",
            Self::Erc721 { .. } => "erc721",
            Self::Erc1155 { .. } => "erc1155",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContract {
    pub value: Option<String>,
    pub address: Option<String>,
    pub decimal: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub block_num: String,
    pub block_num_dec: i64,
    pub unique_id: String,
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: Option<f64>,
    pub asset: Option<String>,
    pub category: String,
    pub raw_contract: RawContract,
    pub token: Token,
    pub block_timestamp: String,
    pub timestamp: i64,
    pub direction: Direction,
}

impl Transaction {
    /// Identity of a transaction within one wallet's history
    pub fn key(&self) -> (String, String) {
        (self.hash.clone(), self.unique_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAddress {
    pub address: String,
    pub has_content: bool,
    pub created_at: String,
}

/// Everything known about one wallet at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedData {
    pub wallet_address: String,
    pub transactions: Vec<Transaction>,
    pub addresses: BTreeMap<ProviderId, Vec<StoredAddress>>,
}

impl SavedData {
    pub fn empty(wallet_address: &str) -> Self {
        Self {
            wallet_address: wallet_address.to_string(),
            transactions: Vec::new(),
            addresses: ProviderId::ALL.iter().map(|id| (*id, Vec::new())).collect(),
        }
    }

    pub fn addresses_for(&self, source: ProviderId) -> &[StoredAddress] {
        self.addresses.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.addresses.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    Disabled,
    Succeeded,
    Failed { kind: String, message: String },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderReport {
    pub status: ProviderStatus,
    pub new_addresses: Vec<StoredAddress>,
    pub total: usize,
    pub skipped: usize,
    pub new_transactions: usize,
}

impl ProviderReport {
    pub fn with_status(status: ProviderStatus) -> Self {
        Self {
            status,
            new_addresses: Vec::new(),
            total: 0,
            skipped: 0,
            new_transactions: 0,
        }
    }
}

/// Per-run diagnostics returned next to the merged snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub providers: BTreeMap<ProviderId, ProviderReport>,
    pub dropped_transactions: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateOutcome {
    pub data: SavedData,
    pub result: AggregationResult,
}
