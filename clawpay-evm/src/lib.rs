#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Base (EVM) payment parsing and revenue split settlement for Clawstack.
//!
//! The EVM half of the payment engine covers two concerns:
//!
//! - **Payment parsing**: decoding ERC-20 `Transfer` logs out of a
//!   transaction receipt and answering finality queries, behind the same
//!   `ChainPaymentParser` capability the Solana crate implements.
//! - **Revenue splits**: each author gets a push-based split contract
//!   deployed through a fixed factory, allocating 90% of content revenue
//!   to the author and 10% to the platform. This crate builds the
//!   canonical split parameters, produces unsigned deployment calldata for
//!   the author's wallet to sign, verifies the resulting deployment
//!   byte-for-byte against the on-chain event, and pushes accumulated
//!   funds out via the split's `distribute` entry point.
//!
//! # Modules
//!
//! - [`contract`] - `sol!` interface definitions for the factory and splits
//! - [`networks`] - Base chain ids, USDC, and factory addresses
//! - [`parser`] - Receipt decoding and the `ChainPaymentParser` impl
//! - [`provider`] - Fallback RPC client and the settlement provider
//! - [`split`] - Canonical split parameters and the split engine

pub mod contract;
pub mod networks;
pub mod parser;
pub mod provider;
pub mod split;

pub use parser::EvmPaymentParser;
pub use provider::{Eip155ChainProvider, EvmSettlementProvider, MetaTransaction};
pub use split::{SplitEngine, SplitError, StoredSplit};
