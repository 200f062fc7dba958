//! Well-known Solana network references and token deployments.

use solana_pubkey::{Pubkey, pubkey};

/// First 32 characters of the Solana mainnet-beta genesis hash (CAIP-2 reference).
pub const SOLANA_MAINNET_REFERENCE: &str = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";

/// First 32 characters of the Solana devnet genesis hash (CAIP-2 reference).
pub const SOLANA_DEVNET_REFERENCE: &str = "EtWTRABZaYq6iMfeYKouRu166VU2xqa1";

/// Native Circle USDC mint on Solana mainnet (SPL Token, 6 decimals).
///
/// Verify: <https://solscan.io/token/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v>
pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

/// Circle USDC testnet mint on Solana devnet (SPL Token, 6 decimals).
///
/// Verify: <https://explorer.solana.com/address/4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU?cluster=devnet>
pub const USDC_DEVNET_MINT: Pubkey = pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

/// SPL Memo program v2.
pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// SPL Memo program v1. Some wallets still emit it.
pub const MEMO_V1_PROGRAM_ID: Pubkey = pubkey!("Memo1UhkJRfHyvLMcVucJwxXeuD728EqVDDwQDxFMNo");
