// Raw transfer payloads as providers return them, and their normalization
// into the typed `Transaction`/`Token` model. Nothing past this module sees
// untyped provider data.

use crate::models::{Direction, Erc1155Entry, RawContract, Token, Transaction};
use chrono::DateTime;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Unknown token shape in transfer {unique_id}: {reason}")]
    UnknownTokenShape { unique_id: String, reason: String },

    #[error("Transfer {0} does not involve the wallet")]
    UnrelatedTransfer(String),

    #[error("Malformed transfer record: {0}")]
    MalformedTransfer(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransferMetadata {
    #[serde(default)]
    pub block_timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransfer {
    pub block_num: String,
    pub unique_id: String,
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub erc721_token_id: Option<String>,
    #[serde(default)]
    pub erc1155_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub raw_contract: RawContract,
    #[serde(default)]
    pub metadata: RawTransferMetadata,
}

/// Resolve the token a transfer moved.
///
/// An ERC-721 id wins over ERC-1155 metadata, which wins over a plain token id.
/// A transfer carrying none of the three is rejected.
pub fn classify_token(raw: &RawTransfer) -> Result<Token, ClassifyError> {
    let contract = raw.raw_contract.address.clone().unwrap_or_default();

    if let Some(token_id) = &raw.erc721_token_id {
        return Ok(Token::Erc721 {
            contract,
            token_id: token_id.clone(),
        });
    }

    if let Some(metadata) = &raw.erc1155_metadata {
        let entries: Vec<Erc1155Entry> =
            serde_json::from_value(metadata.clone()).map_err(|e| ClassifyError::UnknownTokenShape {
                unique_id: raw.unique_id.clone(),
                reason: format!("malformed erc1155 metadata: {}", e),
            })?;
        return Ok(Token::Erc1155 { contract, entries });
    }

    if let Some(token_id) = &raw.token_id {
        return Ok(Token::Fungible {
            contract,
            token_id: token_id.clone(),
        });
    }

    Err(ClassifyError::UnknownTokenShape {
        unique_id: raw.unique_id.clone(),
        reason: "no erc721 id, erc1155 metadata or token id".to_string(),
    })
}

/// Decode one transfer record exactly as a provider sent it.
/// A record with missing or mistyped fields only fails on its own.
pub fn parse_transfer(value: serde_json::Value) -> Result<RawTransfer, ClassifyError> {
    serde_json::from_value(value).map_err(|e| ClassifyError::MalformedTransfer(e.to_string()))
}

pub fn normalize_transfer(raw: &RawTransfer, wallet: &str) -> Result<Transaction, ClassifyError> {
    let token = classify_token(raw)?;
    let direction = Direction::for_wallet(&raw.from, raw.to.as_deref(), wallet)
        .ok_or_else(|| ClassifyError::UnrelatedTransfer(raw.unique_id.clone()))?;

    Ok(Transaction {
        block_num: raw.block_num.clone(),
        block_num_dec: parse_block_number(&raw.block_num),
        unique_id: raw.unique_id.clone(),
        hash: raw.hash.clone(),
        from: raw.from.to_ascii_lowercase(),
        to: raw.to.as_ref().map(|to| to.to_ascii_lowercase()),
        value: raw.value,
        asset: raw.asset.clone(),
        category: raw.category.clone(),
        raw_contract: raw.raw_contract.clone(),
        token,
        block_timestamp: raw.metadata.block_timestamp.clone(),
        timestamp: parse_timestamp(&raw.metadata.block_timestamp),
        direction,
    })
}

/// Block numbers arrive hex encoded ("0x10d4f"), occasionally as decimal
fn parse_block_number(block_num: &str) -> i64 {
    let trimmed = block_num.trim();
    match trimmed.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).unwrap_or(0),
        None => trimmed.parse().unwrap_or(0),
    }
}

fn parse_timestamp(block_timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(block_timestamp)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WALLET: &str = "0x9a006c4de3b93989aa1d16ea78015cec2ebef112";

    fn raw(value: serde_json::Value) -> RawTransfer {
        serde_json::from_value(value).expect("valid raw transfer")
    }

    fn base(extra: serde_json::Value) -> RawTransfer {
        let mut value = json!({
            "blockNum": "0x10d4f",
            "uniqueId": "0xhash:log:1",
            "hash": "0xhash",
            "from": WALLET,
            "to": "0x000000000000000000000000000000000000dead",
            "category": "erc20",
            "rawContract": { "address": "0xcontract", "value": "0x1", "decimal": 18 },
            "metadata": { "blockTimestamp": "2023-11-13T10:00:00.000Z" }
        });
        if let (Some(target), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        raw(value)
    }

    #[test]
    fn erc721_id_yields_nft_721() {
        let transfer = base(json!({ "erc721TokenId": "0x01", "tokenId": "0x01" }));
        assert_eq!(
            classify_token(&transfer),
            Ok(Token::Erc721 {
                contract: "0xcontract".to_string(),
                token_id: "0x01".to_string()
            })
        );
    }

    #[test]
    fn erc1155_metadata_yields_nft_1155() {
        let transfer = base(json!({
            "erc1155Metadata": [{ "tokenId": "0x02", "value": "0x3" }],
            "erc721TokenId": null
        }));
        match classify_token(&transfer) {
            Ok(Token::Erc1155 { contract, entries }) => {
                assert_eq!(contract, "0xcontract");
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].token_id, "0x02");
            }
            other => panic!("expected erc1155, got {:?}", other),
        }
    }

    #[test]
    fn empty_token_id_is_fungible() {
        let transfer = base(json!({ "tokenId": "" }));
        assert!(matches!(classify_token(&transfer), Ok(Token::Fungible { token_id, .. }) if token_id.is_empty()));
    }

    #[test]
    fn missing_fields_are_unknown_shape() {
        let transfer = base(json!({}));
        assert!(matches!(
            classify_token(&transfer),
            Err(ClassifyError::UnknownTokenShape { .. })
        ));
    }

    #[test]
    fn malformed_erc1155_metadata_is_unknown_shape() {
        let transfer = base(json!({ "erc1155Metadata": { "oops": true } }));
        assert!(matches!(
            classify_token(&transfer),
            Err(ClassifyError::UnknownTokenShape { .. })
        ));
    }

    #[test]
    fn normalize_derives_direction_and_numbers() {
        let transfer = base(json!({ "tokenId": "" }));
        let tx = normalize_transfer(&transfer, WALLET).unwrap();
        assert_eq!(tx.direction, Direction::Outgoing);
        assert_eq!(tx.block_num_dec, 0x10d4f);
        assert_eq!(tx.timestamp, 1699869600);

        let incoming = normalize_transfer(&transfer, "0x000000000000000000000000000000000000DEAD").unwrap();
        assert_eq!(incoming.direction, Direction::Incoming);
    }

    #[test]
    fn self_transfer_is_in_and_out() {
        let transfer = base(json!({ "tokenId": "", "to": WALLET.to_uppercase().replace("0X", "0x") }));
        let tx = normalize_transfer(&transfer, WALLET).unwrap();
        assert_eq!(tx.direction, Direction::InAndOut);
    }

    #[test]
    fn unrelated_transfer_is_rejected() {
        let transfer = base(json!({ "tokenId": "", "from": "0x1111" }));
        assert_eq!(
            normalize_transfer(&transfer, WALLET),
            Err(ClassifyError::UnrelatedTransfer("0xhash:log:1".to_string()))
        );
    }

    #[test]
    fn record_missing_hash_is_malformed() {
        let record = json!({
            "blockNum": "0x1",
            "uniqueId": "0xhash:log:2",
            "from": WALLET,
            "tokenId": ""
        });
        assert!(matches!(parse_transfer(record), Err(ClassifyError::MalformedTransfer(_))));

        let good = json!({ "blockNum": "0x1", "uniqueId": "u", "hash": "0xh", "from": WALLET });
        assert_eq!(parse_transfer(good).unwrap().hash, "0xh");
    }
}
