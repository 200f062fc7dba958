//! The payment verification data model.
//!
//! Inputs ([`PaymentProof`], [`ResourceContext`]) are transient and never
//! persisted as-is; the output [`VerifiedPayment`] is immutable and only
//! ever constructed at the end of a fully successful pipeline run.

use serde::{Deserialize, Serialize};

use crate::amount::SettlementAmounts;
use crate::chain::Chain;
use crate::timestamp::UnixTimestamp;

/// The kind of resource a payment claims to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// A paid post.
    Post,
    /// A spam deposit charged to unknown agents before they can interact.
    SpamFee,
}

/// A caller-supplied claim that a payment happened on chain.
///
/// Nothing in this struct is trusted: the transaction reference is the
/// only field the pipeline dereferences, and every other claim is checked
/// against what the chain actually recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    /// The chain the payment was made on.
    pub chain: Chain,
    /// The transaction signature (Solana) or hash (EVM).
    pub transaction_reference: String,
    /// The wallet the caller claims paid.
    pub payer_address: String,
    /// What kind of resource is being paid for.
    pub resource: ResourceKind,
    /// The resource id the payment must be bound to.
    pub resource_id: String,
    /// When the caller made the request; defaults to "now" when absent.
    ///
    /// Memo freshness is measured against this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_timestamp: Option<UnixTimestamp>,
}

/// A token transfer extracted from an on-chain transaction.
///
/// Addresses are canonical strings: base58 on Solana, lowercase `0x` hex
/// on EVM chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    /// The wallet that authorized the transfer.
    pub source: String,
    /// The account the funds landed in. On Solana this is a token
    /// account, not a wallet.
    pub destination: String,
    /// The wallet owning `destination`, when the chain record resolves it
    /// (Solana token balances); `None` on EVM where `destination` already
    /// is the wallet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_owner: Option<String>,
    /// The transferred amount in atomic units.
    pub amount_raw: u64,
    /// The token mint (Solana) or contract address (EVM).
    pub mint: String,
}

impl TokenTransfer {
    /// Whether this transfer pays the given recipient address, either
    /// directly or through a token account owned by it.
    ///
    /// EVM hex addresses are compared case-insensitively (checksum casing
    /// carries no identity); base58 addresses are compared exactly, since
    /// base58 is case-sensitive.
    #[must_use]
    pub fn pays(&self, recipient: &str) -> bool {
        if addresses_match(&self.destination, recipient) {
            return true;
        }
        self.destination_owner
            .as_deref()
            .is_some_and(|owner| addresses_match(owner, recipient))
    }
}

/// Compares two canonical address strings for identity.
#[must_use]
pub fn addresses_match(a: &str, b: &str) -> bool {
    if a.starts_with("0x") && b.starts_with("0x") {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Everything a chain backend extracted from a fetched transaction.
///
/// Produced by a [`crate::verify::ChainPaymentParser`]; consumed by the
/// verification pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    /// Every transfer found in the transaction, in instruction/log order.
    pub transfers: Vec<TokenTransfer>,
    /// The raw memo string, if the transaction carried one.
    pub memo: Option<String>,
}

/// A chain's graduated certainty that a transaction will not be reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmationStatus {
    /// Seen by the chain but not yet past the acceptance threshold.
    Processed,
    /// Voted on by a supermajority / included in a recent block.
    Confirmed,
    /// Irreversible.
    Finalized,
}

/// Which address a payment must have been sent to.
///
/// Content payments route through the author's revenue split contract;
/// spam deposits go straight to the platform treasury. The policy is
/// resolved here, once, by resource kind — the pipeline itself only ever
/// compares against [`expected_recipient`](Self::expected_recipient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientPolicy {
    /// Payment must land in the author's deployed split contract.
    AuthorSplit {
        /// The author's split contract (EVM) or split vault owner (Solana).
        split_address: String,
    },
    /// Payment must land in the platform treasury for the chain.
    PlatformTreasury {
        /// The treasury address configured for the chain.
        treasury_address: String,
    },
}

impl RecipientPolicy {
    /// Resolves the policy for a resource kind.
    pub fn for_resource<S: Into<String>>(kind: ResourceKind, address: S) -> Self {
        match kind {
            ResourceKind::Post => Self::AuthorSplit {
                split_address: address.into(),
            },
            ResourceKind::SpamFee => Self::PlatformTreasury {
                treasury_address: address.into(),
            },
        }
    }

    /// The address the payment transfer must have paid.
    #[must_use]
    pub fn expected_recipient(&self) -> &str {
        match self {
            Self::AuthorSplit { split_address } => split_address,
            Self::PlatformTreasury { treasury_address } => treasury_address,
        }
    }
}

/// Resource-side expectations the caller resolved before verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceContext {
    /// What the resource costs, in atomic units.
    pub expected_amount_raw: u64,
    /// Who must have been paid.
    pub recipient: RecipientPolicy,
}

/// A cryptographically and semantically validated payment event.
///
/// Constructed only at the end of a fully successful verification
/// pipeline; never partially populated. The caller persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayment {
    /// The on-chain transaction reference.
    pub transaction_reference: String,
    /// The wallet that actually authorized the transfer on chain.
    pub payer_address: String,
    /// The recipient the payment was validated against.
    pub recipient_address: String,
    /// The transferred amount in atomic units.
    pub amount_raw: u64,
    /// The currency's mint / token contract address.
    pub currency: String,
    /// The raw memo string, when the chain carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// The resource this payment is bound to.
    pub resource_id: String,
    /// The payment's timestamp: the memo's on Solana, the claimed request
    /// time otherwise.
    pub timestamp: UnixTimestamp,
    /// Finality at verification time. Only ever `Confirmed` or
    /// `Finalized` here, by construction.
    pub confirmation_status: ConfirmationStatus,
}

/// The engine's success type: the verified payment plus the derived
/// settlement bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    /// The validated payment event.
    pub payment: VerifiedPayment,
    /// Author/platform revenue breakdown of the paid amount.
    pub fees: SettlementAmounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_addresses_match_case_insensitively() {
        assert!(addresses_match(
            "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
            "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
        ));
        assert!(!addresses_match(
            "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
            "0x036cbd53842c5426634e7929541ec2318f3dcf7e"
        ));
    }

    #[test]
    fn test_base58_addresses_match_exactly() {
        assert!(!addresses_match(
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "epjfwdd5aufqssqem2qn1xzybapc8g4weggkzwytdt1v"
        ));
    }

    #[test]
    fn test_transfer_pays_via_owner() {
        let transfer = TokenTransfer {
            source: "Payer11111111111111111111111111111111111111".into(),
            destination: "TokenAcc111111111111111111111111111111111111".into(),
            destination_owner: Some("Treasury1111111111111111111111111111111111".into()),
            amount_raw: 250_000,
            mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".into(),
        };
        assert!(transfer.pays("Treasury1111111111111111111111111111111111"));
        assert!(transfer.pays("TokenAcc111111111111111111111111111111111111"));
        assert!(!transfer.pays("Mallory1111111111111111111111111111111111"));
    }

    #[test]
    fn test_recipient_policy_resolution() {
        let policy = RecipientPolicy::for_resource(ResourceKind::Post, "0xsplit");
        assert_eq!(policy.expected_recipient(), "0xsplit");
        assert!(matches!(policy, RecipientPolicy::AuthorSplit { .. }));

        let policy = RecipientPolicy::for_resource(ResourceKind::SpamFee, "0xtreasury");
        assert!(matches!(policy, RecipientPolicy::PlatformTreasury { .. }));
    }

    #[test]
    fn test_proof_deserializes_camel_case() {
        let proof: PaymentProof = serde_json::from_str(
            r#"{
                "chain": "solana",
                "transactionReference": "5sig",
                "payerAddress": "Payer",
                "resource": "post",
                "resourceId": "post-abc",
                "claimedTimestamp": "1706960100"
            }"#,
        )
        .unwrap();
        assert_eq!(proof.chain, Chain::Solana);
        assert_eq!(proof.resource, ResourceKind::Post);
        assert_eq!(proof.claimed_timestamp.unwrap().as_secs(), 1_706_960_100);
    }

    #[test]
    fn test_confirmation_status_ordering() {
        assert!(ConfirmationStatus::Processed < ConfirmationStatus::Confirmed);
        assert!(ConfirmationStatus::Confirmed < ConfirmationStatus::Finalized);
    }
}
