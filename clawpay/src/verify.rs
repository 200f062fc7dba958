//! The chain-agnostic payment verification pipeline.
//!
//! [`PaymentVerifier`] applies the verification rule set — currency match,
//! recipient match, amount floor, memo binding and freshness, finality —
//! over records produced by a chain-specific [`ChainPaymentParser`]. Each
//! stage either passes its result to the next or raises an immediately
//! terminating, specifically-typed [`VerificationError`]: there is no
//! partial credit and no "mostly valid" payment.
//!
//! Finality is re-queried in a second round-trip rather than reused from
//! the fetched record, since status can advance between calls.

use std::future::Future;

use crate::amount::SettlementAmounts;
use crate::chain::Chain;
use crate::error::VerificationError;
use crate::memo::PaymentMemo;
use crate::timestamp::UnixTimestamp;
use crate::types::{
    ConfirmationStatus, PaymentProof, PaymentRecord, ResourceContext, VerificationOutcome,
    VerifiedPayment,
};

/// Default memo freshness window in seconds.
pub const DEFAULT_MEMO_EXPIRY_SECS: u64 = 300;

/// Chain-specific record fetching and decoding.
///
/// One implementation exists per supported chain (`clawpay-svm`,
/// `clawpay-evm`). A new chain adds an implementation; the pipeline is
/// untouched.
pub trait ChainPaymentParser {
    /// The chain this parser reads.
    fn chain(&self) -> Chain;

    /// Fetches the transaction for a reference and extracts its transfers
    /// and memo.
    ///
    /// Must fail [`VerificationError::TransactionNotFound`] when no such
    /// transaction exists, [`VerificationError::TransactionFailed`] when
    /// the chain reports an execution error, and
    /// [`VerificationError::StatusUnknown`] when every configured RPC
    /// endpoint is exhausted.
    fn fetch_payment(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<PaymentRecord, VerificationError>> + Send;

    /// Queries the transaction's current confirmation status directly.
    fn confirmation_status(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<ConfirmationStatus, VerificationError>> + Send;
}

/// Pipeline policy knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    /// The stablecoin mint (Solana) or token contract (EVM) payments must
    /// use, as a canonical address string.
    pub expected_mint: String,
    /// Maximum absolute skew between the memo timestamp and the claimed
    /// request time, in seconds. Boundary-inclusive.
    pub memo_expiry_secs: u64,
    /// Platform revenue share in basis points.
    pub platform_fee_bps: u16,
}

impl VerifierSettings {
    /// Creates settings with the default memo window.
    pub fn new<S: Into<String>>(expected_mint: S, platform_fee_bps: u16) -> Self {
        Self {
            expected_mint: expected_mint.into(),
            memo_expiry_secs: DEFAULT_MEMO_EXPIRY_SECS,
            platform_fee_bps,
        }
    }
}

/// The payment verification engine for one chain.
///
/// Stateless: every call re-queries the chain, and independent
/// verifications share nothing, so verifiers are cheap to hold per chain
/// and safe to use concurrently.
#[derive(Debug)]
pub struct PaymentVerifier<P> {
    parser: P,
    settings: VerifierSettings,
}

impl<P: ChainPaymentParser> PaymentVerifier<P> {
    /// Creates a verifier over a chain parser.
    pub const fn new(parser: P, settings: VerifierSettings) -> Self {
        Self { parser, settings }
    }

    /// Returns the chain this verifier reads.
    pub fn chain(&self) -> Chain {
        self.parser.chain()
    }

    /// Verifies a claimed payment against the chain record.
    ///
    /// Stages, in order; the first violated rule terminates the pipeline:
    ///
    /// 1. fetch — `TransactionNotFound` / `TransactionFailed` / `StatusUnknown`
    /// 2. currency selection — `NoMatchingTransfer`
    /// 3. recipient — `WrongRecipient`
    /// 4. amount floor (overpayment accepted) — `InsufficientAmount`
    /// 5. memo binding and freshness (Solana only) — `InvalidMemo` / `MemoExpired`
    /// 6. finality, re-queried — `NotConfirmed` / `StatusUnknown`
    ///
    /// # Errors
    ///
    /// Returns the [`VerificationError`] for the first violated rule.
    pub async fn verify_payment(
        &self,
        proof: &PaymentProof,
        ctx: &ResourceContext,
    ) -> Result<VerificationOutcome, VerificationError> {
        debug_assert_eq!(proof.chain, self.parser.chain(), "proof routed to wrong verifier");

        let record = self.parser.fetch_payment(&proof.transaction_reference).await?;

        let transfer = record
            .transfers
            .iter()
            .find(|t| crate::types::addresses_match(&t.mint, &self.settings.expected_mint))
            .ok_or(VerificationError::NoMatchingTransfer)?;

        let expected_recipient = ctx.recipient.expected_recipient();
        if !transfer.pays(expected_recipient) {
            return Err(VerificationError::WrongRecipient);
        }

        if transfer.amount_raw < ctx.expected_amount_raw {
            return Err(VerificationError::InsufficientAmount {
                expected: ctx.expected_amount_raw,
                actual: transfer.amount_raw,
            });
        }

        let claimed = proof.claimed_timestamp.unwrap_or_else(UnixTimestamp::now);
        let timestamp = if self.parser.chain() == Chain::Solana {
            self.validate_memo(&record, proof, claimed)?
        } else {
            claimed
        };

        let status = self
            .parser
            .confirmation_status(&proof.transaction_reference)
            .await?;
        if status < ConfirmationStatus::Confirmed {
            return Err(VerificationError::NotConfirmed);
        }

        tracing::debug!(
            chain = %proof.chain,
            tx = %proof.transaction_reference,
            resource = %proof.resource_id,
            amount = transfer.amount_raw,
            status = ?status,
            "Payment verified"
        );

        let fees = SettlementAmounts::split(transfer.amount_raw, self.settings.platform_fee_bps);
        Ok(VerificationOutcome {
            payment: VerifiedPayment {
                transaction_reference: proof.transaction_reference.clone(),
                payer_address: transfer.source.clone(),
                recipient_address: expected_recipient.to_owned(),
                amount_raw: transfer.amount_raw,
                currency: transfer.mint.clone(),
                memo: record.memo.clone(),
                resource_id: proof.resource_id.clone(),
                timestamp,
                confirmation_status: status,
            },
            fees,
        })
    }

    /// Validates memo presence, format, resource binding, and freshness.
    fn validate_memo(
        &self,
        record: &PaymentRecord,
        proof: &PaymentProof,
        claimed: UnixTimestamp,
    ) -> Result<UnixTimestamp, VerificationError> {
        let raw = record
            .memo
            .as_deref()
            .ok_or_else(|| VerificationError::InvalidMemo("missing memo instruction".into()))?;
        let memo = PaymentMemo::parse(raw)?;
        if memo.resource_id != proof.resource_id {
            return Err(VerificationError::InvalidMemo(format!(
                "memo is bound to resource {:?}, not {:?}",
                memo.resource_id, proof.resource_id
            )));
        }
        if claimed.abs_diff(memo.timestamp) > self.settings.memo_expiry_secs {
            return Err(VerificationError::MemoExpired);
        }
        Ok(memo.timestamp)
    }
}
