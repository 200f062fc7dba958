//! Known Base network constants and token deployments.

use alloy_primitives::{Address, address};

/// Base Mainnet chain ID.
pub const BASE_MAINNET: u64 = 8453;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: u64 = 84532;

/// USDC contract address on Base Mainnet (6 decimals).
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Base Sepolia (6 decimals).
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// The push-split factory. Deployed deterministically, so the address is
/// the same on Base mainnet and Base Sepolia.
pub const SPLIT_FACTORY: Address = address!("aDC87646f736d6A82e9a6539cddC488b2aA07f38");

/// Formats an address in the canonical lowercase-hex form used across the
/// chain-agnostic payment types.
#[must_use]
pub fn canonical_address(address: &Address) -> String {
    format!("0x{}", alloy_primitives::hex::encode(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_address_is_lowercase() {
        assert_eq!(
            canonical_address(&USDC_BASE),
            "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"
        );
    }
}
