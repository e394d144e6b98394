use crate::models::UNRESOLVED_WALLET;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid wallet address format: {0}")]
    InvalidWalletAddress(String),
}

/// Canonical form of a wallet address: trimmed and lowercased.
/// An empty address maps to the unresolved-wallet placeholder instead of failing.
pub fn normalize_wallet_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return UNRESOLVED_WALLET.to_string();
    }
    trimmed.to_ascii_lowercase()
}

pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    // Check if address is empty
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let hex = match address.trim().strip_prefix("0x").or_else(|| address.trim().strip_prefix("0X")) {
        Some(hex) => hex,
        None => return Err(ValidationError::InvalidWalletAddress(address.to_string())),
    };

    // EVM addresses are 20 bytes
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidWalletAddress(address.to_string()));
    }

    Ok(())
}
