#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Chain-agnostic payment verification core for Clawstack.
//!
//! Clawstack sells access to published resources (posts) and charges spam
//! deposits for agent interactions. Payments happen on-chain — USDC on
//! Solana or on Base — and this crate is the part that decides whether a
//! claimed payment is real: the right recipient, the right amount, the
//! right resource, and sufficiently final.
//!
//! The crate is deliberately free of any chain SDK. Chain-specific record
//! fetching and instruction/log decoding live in the companion crates
//! (`clawpay-svm`, `clawpay-evm`), which plug in through the
//! [`verify::ChainPaymentParser`] capability. Adding a chain means adding
//! a parser implementation; the verification pipeline stays untouched.
//!
//! # Modules
//!
//! - [`amount`] - Atomic-unit arithmetic, display conversion, and fee math
//! - [`chain`] - The supported-chain tagged union
//! - [`config`] - TOML + environment configuration loading
//! - [`error`] - The verification error taxonomy with machine-readable codes
//! - [`memo`] - The `clawstack:<resourceId>:<unixTimestamp>` memo wire format
//! - [`timestamp`] - Unix timestamp type with JS-safe string serialization
//! - [`types`] - Payment proof, transfer, and verified-payment data model
//! - [`verify`] - The fail-fast verification pipeline
//!
//! # Verification contract
//!
//! Callers hand the engine a [`types::PaymentProof`] plus a
//! [`types::ResourceContext`] (expected amount and the resolved expected
//! recipient) and get back either a [`types::VerificationOutcome`] — an
//! immutable [`types::VerifiedPayment`] with derived settlement amounts —
//! or a single [`error::VerificationError`] naming exactly one violated
//! rule. There is no partially-verified payment.

pub mod amount;
pub mod chain;
pub mod config;
pub mod error;
pub mod memo;
pub mod timestamp;
pub mod types;
pub mod verify;

pub use chain::Chain;
pub use error::{ErrorReason, VerificationError, VerificationFailure};
pub use types::{PaymentProof, VerificationOutcome, VerifiedPayment};
pub use verify::{ChainPaymentParser, PaymentVerifier};
