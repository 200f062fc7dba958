//! The payment verification error taxonomy.
//!
//! Every verification failure is exactly one of these kinds — the pipeline
//! raises on the first violated rule and never aggregates, so an automated
//! caller (frequently itself a programmatic agent) always gets one
//! actionable root cause. Each kind maps to a stable machine-readable
//! [`ErrorReason`] code; the web layer maps those to HTTP statuses without
//! string matching.

use serde::{Deserialize, Serialize};

/// Errors that can occur during payment verification or split validation.
///
/// The ordering of pipeline checks (existence → success → content →
/// recipient → amount → memo → finality) means a more fundamental problem
/// always wins over a later one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum VerificationError {
    /// No transaction exists on chain for the supplied reference.
    #[error("Transaction not found on chain")]
    TransactionNotFound,
    /// The transaction exists but its on-chain execution failed.
    #[error("Transaction failed on chain: {0}")]
    TransactionFailed(String),
    /// The transaction carries no transfer of the expected currency.
    #[error("No transfer of the expected currency found in transaction")]
    NoMatchingTransfer,
    /// The payment transfer pays someone other than the expected recipient.
    #[error("Payment recipient does not match the expected recipient")]
    WrongRecipient,
    /// The transfer amount is below the expected amount.
    #[error("Transfer amount {actual} is below the expected amount {expected}")]
    InsufficientAmount {
        /// The expected amount in atomic units.
        expected: u64,
        /// The actual transferred amount in atomic units.
        actual: u64,
    },
    /// The payment memo is missing or malformed.
    #[error("Invalid payment memo: {0}")]
    InvalidMemo(String),
    /// The payment memo is well-formed but outside the freshness window.
    #[error("Payment memo timestamp is outside the expiry window")]
    MemoExpired,
    /// The transaction has not reached sufficient finality.
    #[error("Transaction is not yet confirmed")]
    NotConfirmed,
    /// The chain could not report the transaction's status at all.
    #[error("Chain could not report transaction status: {0}")]
    StatusUnknown(String),
    /// A split deployment's recipient list does not match the canonical one.
    #[error("Split recipient list does not match the expected recipients")]
    RecipientMismatch,
    /// A split deployment's allocation list does not match the canonical one.
    #[error("Split allocation list does not match the expected allocations")]
    AllocationMismatch,
}

impl VerificationError {
    /// Returns the machine-readable reason code for this error.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        match self {
            Self::TransactionNotFound => ErrorReason::TransactionNotFound,
            Self::TransactionFailed(_) => ErrorReason::TransactionFailed,
            Self::NoMatchingTransfer => ErrorReason::NoMatchingTransfer,
            Self::WrongRecipient => ErrorReason::WrongRecipient,
            Self::InsufficientAmount { .. } => ErrorReason::InsufficientAmount,
            Self::InvalidMemo(_) => ErrorReason::InvalidMemo,
            Self::MemoExpired => ErrorReason::MemoExpired,
            Self::NotConfirmed => ErrorReason::NotConfirmed,
            Self::StatusUnknown(_) => ErrorReason::StatusUnknown,
            Self::RecipientMismatch => ErrorReason::RecipientMismatch,
            Self::AllocationMismatch => ErrorReason::AllocationMismatch,
        }
    }

    /// Converts this error into a wire-serializable failure record.
    #[must_use]
    pub fn to_failure(&self) -> VerificationFailure {
        VerificationFailure {
            error_kind: self.reason(),
            message: self.to_string(),
        }
    }
}

impl From<crate::memo::MemoFormatError> for VerificationError {
    fn from(e: crate::memo::MemoFormatError) -> Self {
        Self::InvalidMemo(e.to_string())
    }
}

/// Machine-readable reason codes for payment verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorReason {
    /// No transaction exists for the reference.
    TransactionNotFound,
    /// The transaction reverted / errored on chain.
    TransactionFailed,
    /// Right transaction, wrong or absent currency.
    NoMatchingTransfer,
    /// The recipient doesn't match.
    WrongRecipient,
    /// The amount is below what the resource costs.
    InsufficientAmount,
    /// The memo is missing or malformed.
    InvalidMemo,
    /// The memo is well-formed but stale.
    MemoExpired,
    /// Finality is insufficient.
    NotConfirmed,
    /// The chain could not answer a status query.
    StatusUnknown,
    /// Split recipients don't match the canonical deployment.
    RecipientMismatch,
    /// Split allocations don't match the canonical deployment.
    AllocationMismatch,
}

impl ErrorReason {
    /// Returns the `snake_case` string representation matching the wire format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TransactionNotFound => "transaction_not_found",
            Self::TransactionFailed => "transaction_failed",
            Self::NoMatchingTransfer => "no_matching_transfer",
            Self::WrongRecipient => "wrong_recipient",
            Self::InsufficientAmount => "insufficient_amount",
            Self::InvalidMemo => "invalid_memo",
            Self::MemoExpired => "memo_expired",
            Self::NotConfirmed => "not_confirmed",
            Self::StatusUnknown => "status_unknown",
            Self::RecipientMismatch => "recipient_mismatch",
            Self::AllocationMismatch => "allocation_mismatch",
        }
    }
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wire-serializable verification failure: reason code plus detail.
///
/// Returned to the web layer in place of a `VerifiedPayment`; a payment is
/// never partially verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationFailure {
    /// The machine-readable error kind.
    pub error_kind: ErrorReason,
    /// Human-readable details.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_snake_case() {
        assert_eq!(
            ErrorReason::TransactionNotFound.to_string(),
            "transaction_not_found"
        );
        assert_eq!(
            serde_json::to_string(&ErrorReason::MemoExpired).unwrap(),
            "\"memo_expired\""
        );
    }

    #[test]
    fn test_failure_record_serialization() {
        let failure = VerificationError::InsufficientAmount {
            expected: 250_000,
            actual: 100_000,
        }
        .to_failure();
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["errorKind"], "insufficient_amount");
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .contains("below the expected amount")
        );
    }

    #[test]
    fn test_memo_error_maps_to_invalid_memo() {
        let err: VerificationError = crate::memo::MemoFormatError::SegmentCount(2).into();
        assert_eq!(err.reason(), ErrorReason::InvalidMemo);
    }
}
