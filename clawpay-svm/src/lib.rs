#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana payment record fetching and parsing for Clawstack.
//!
//! This crate is the Solana half of the payment verification engine. It
//! fetches confirmed transactions through an ordered multi-endpoint RPC
//! pool, extracts SPL token transfers and the payment memo from the
//! transaction record — including inner instructions, since composed
//! transactions are common — and answers finality queries.
//!
//! The trust model is post-hoc record inspection: the payer already
//! submitted the transaction, and this crate decides what that confirmed
//! record actually says. Nothing here ever signs or submits anything.
//!
//! # Modules
//!
//! - [`networks`] - Well-known Solana networks and USDC deployments
//! - [`parser`] - Transfer/memo extraction and the `ChainPaymentParser` impl
//! - [`provider`] - Ordered-fallback RPC endpoint pool
//!
//! # Usage
//!
//! ```ignore
//! use clawpay::verify::{PaymentVerifier, VerifierSettings};
//! use clawpay_svm::{SolanaPaymentParser, SolanaRpcPool};
//!
//! let pool = SolanaRpcPool::from_urls(&config.rpc_urls)?;
//! let parser = SolanaPaymentParser::new(pool);
//! let verifier = PaymentVerifier::new(
//!     parser,
//!     VerifierSettings::new(clawpay_svm::USDC_MINT.to_string(), 1000),
//! );
//! let outcome = verifier.verify_payment(&proof, &ctx).await?;
//! ```

pub mod networks;
pub mod parser;
pub mod provider;

pub use networks::{USDC_DEVNET_MINT, USDC_MINT};
pub use parser::SolanaPaymentParser;
pub use provider::{RpcPoolError, SolanaRpcPool};
