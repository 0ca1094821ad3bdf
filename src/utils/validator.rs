//! Address format checks
//!
//! Pure pre-flight gate run before any rate-limited or paid call.

use crate::models::config::{ChainFamily, ChainId};

/// Solana pubkeys render as 32-44 base58 characters
const SOLANA_MIN_LEN: usize = 32;
const SOLANA_MAX_LEN: usize = 44;

/// EVM addresses: `0x` + 20 bytes hex
const EVM_HEX_LEN: usize = 40;

/// Check `address` against the conventions of `chain`'s family
pub fn is_valid_address(address: &str, chain: ChainId) -> bool {
    match chain.family() {
        ChainFamily::Evm => is_valid_evm_address(address),
        ChainFamily::Solana => is_valid_solana_address(address),
    }
}

/// `0x` followed by exactly 40 hex characters, any case
#[inline]
pub fn is_valid_evm_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex_part) => hex_part.len() == EVM_HEX_LEN && hex::decode(hex_part).is_ok(),
        None => false,
    }
}

/// Base58 alphabet (no `0`, `O`, `I`, `l`), 32-44 characters
#[inline]
pub fn is_valid_solana_address(address: &str) -> bool {
    (SOLANA_MIN_LEN..=SOLANA_MAX_LEN).contains(&address.len())
        && bs58::decode(address).into_vec().is_ok()
}
