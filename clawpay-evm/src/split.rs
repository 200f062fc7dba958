//! Author revenue splits: canonical parameters, deployment verification,
//! and push distribution.
//!
//! Every author gets one push-split contract per chain, deployed through a
//! fixed factory and splitting content revenue 90/10 between author and
//! platform. Three rules keep this safe:
//!
//! - The engine never holds the author's key: deployment is returned as
//!   unsigned calldata for the author's wallet to sign.
//! - A claimed deployment is only persisted after [`SplitEngine::verify_deployment`]
//!   re-derives the canonical parameters and compares them byte-for-byte
//!   against the on-chain `SplitCreated` event, so an altered deployment
//!   can never be silently accepted.
//! - Distribution rebuilds parameters from the addresses stored at
//!   deployment time, never from current configuration — a later address
//!   change must not retroactively alter a deployed contract's behavior.

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::Provider;
use alloy_sol_types::{SolCall, SolEvent};
use serde::{Deserialize, Serialize};

use clawpay::error::VerificationError;

use crate::contract::{ISplitFactory, ISplitWallet, SplitParams};
use crate::provider::{EvmSettlementProvider, MetaTransaction};

/// The author's share of content revenue, in basis points.
pub const AUTHOR_SHARE_BPS: u16 = 9000;

/// The platform's share of content revenue, in basis points.
pub const PLATFORM_SHARE_BPS: u16 = 1000;

/// The allocation scale the split contracts use; each recipient's
/// allocation is its share of this total.
pub const TOTAL_ALLOCATION: u64 = 1_000_000;

/// Incentive paid to third-party distributors. Distribution is pushed by
/// the platform itself, so none is offered.
pub const DISTRIBUTION_INCENTIVE: u16 = 0;

/// A persisted author split record.
///
/// Created once per author per chain; the addresses captured here at
/// deployment time are the only input [`SplitEngine::distribute`] accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSplit {
    /// The author this split belongs to.
    pub author_id: String,
    /// The deployed split contract address (lowercase hex).
    pub split_address: String,
    /// The author's wallet at deployment time (lowercase hex).
    pub author_address: String,
    /// The platform's wallet at deployment time (lowercase hex).
    pub platform_address: String,
    /// The author's share in basis points.
    pub author_share_bps: u16,
    /// The platform's share in basis points.
    pub platform_share_bps: u16,
    /// The EIP-155 chain the split is deployed on.
    pub chain_id: u64,
}

/// Errors from split deployment verification and distribution.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// A stored address failed to parse.
    #[error("Invalid address in split record: {0:?}")]
    InvalidAddress(String),
    /// A stored split's shares do not sum to 100%.
    #[error("Split shares are inconsistent: {0} + {1} != 10000")]
    InconsistentShares(u16, u16),
    /// RPC transport failure.
    #[error("RPC error: {0}")]
    Rpc(String),
    /// The claimed deployment transaction does not exist.
    #[error("Deployment transaction not found")]
    DeploymentNotFound,
    /// The claimed deployment transaction reverted.
    #[error("Deployment transaction reverted")]
    Reverted,
    /// The receipt carries no `SplitCreated` event from the factory.
    #[error("No SplitCreated event from factory {0} in receipt")]
    EventMissing(Address),
    /// The deployed recipient list differs from the canonical one.
    #[error("Split recipient list does not match canonical parameters")]
    RecipientMismatch,
    /// The deployed allocation values differ from the canonical ones.
    #[error("Split allocation values do not match canonical parameters")]
    AllocationMismatch,
    /// Sending the distribution transaction failed.
    #[error("Settlement failed: {0}")]
    Settlement(String),
    /// The distribution transaction reverted on chain.
    #[error("Distribution transaction reverted: {0}")]
    DistributionReverted(TxHash),
}

impl From<SplitError> for VerificationError {
    fn from(e: SplitError) -> Self {
        match e {
            SplitError::DeploymentNotFound => Self::TransactionNotFound,
            SplitError::Reverted => Self::TransactionFailed("deployment reverted".into()),
            // Right transaction, wrong/absent content.
            SplitError::EventMissing(_) => Self::NoMatchingTransfer,
            SplitError::RecipientMismatch => Self::RecipientMismatch,
            SplitError::AllocationMismatch => Self::AllocationMismatch,
            SplitError::InvalidAddress(_)
            | SplitError::InconsistentShares(_, _)
            | SplitError::Rpc(_)
            | SplitError::Settlement(_)
            | SplitError::DistributionReverted(_) => Self::StatusUnknown(e.to_string()),
        }
    }
}

/// Builds split parameters for two parties with the given shares,
/// recipients sorted ascending by address bytes (equivalently, by
/// lowercase hex) as the contracts require.
///
/// Deterministic for any input order of the two parties.
#[must_use]
pub fn split_params(
    author: Address,
    author_bps: u16,
    platform: Address,
    platform_bps: u16,
) -> SplitParams {
    let mut pairs = [
        (author, allocation(author_bps)),
        (platform, allocation(platform_bps)),
    ];
    pairs.sort_by_key(|(address, _)| *address);
    SplitParams {
        recipients: pairs.iter().map(|(address, _)| *address).collect(),
        allocations: pairs.iter().map(|(_, allocation)| *allocation).collect(),
        totalAllocation: U256::from(TOTAL_ALLOCATION),
        distributionIncentive: DISTRIBUTION_INCENTIVE,
    }
}

/// The canonical 90/10 author/platform split.
#[must_use]
pub fn two_party_params(author: Address, platform: Address) -> SplitParams {
    split_params(author, AUTHOR_SHARE_BPS, platform, PLATFORM_SHARE_BPS)
}

const fn allocation(bps: u16) -> U256 {
    U256::from_limbs([bps as u64 * (TOTAL_ALLOCATION / 10_000), 0, 0, 0])
}

/// Compares a deployed split's parameters against the canonical expected
/// ones: length and element-wise recipients, then allocations, then the
/// scale. Nothing is accepted as "close enough".
///
/// # Errors
///
/// [`SplitError::RecipientMismatch`] or [`SplitError::AllocationMismatch`]
/// on the first difference.
pub fn validate_params(actual: &SplitParams, expected: &SplitParams) -> Result<(), SplitError> {
    if actual.recipients.len() != expected.recipients.len()
        || actual.recipients != expected.recipients
    {
        return Err(SplitError::RecipientMismatch);
    }
    if actual.allocations != expected.allocations
        || actual.totalAllocation != expected.totalAllocation
    {
        return Err(SplitError::AllocationMismatch);
    }
    Ok(())
}

/// Finds and decodes the `SplitCreated` event emitted by `factory`.
fn split_created_from_logs<'a>(
    logs: impl Iterator<Item = &'a alloy_primitives::Log>,
    factory: Address,
) -> Option<ISplitFactory::SplitCreated> {
    logs.filter(|log| log.address == factory)
        .filter(|log| {
            log.data.topics().first() == Some(&ISplitFactory::SplitCreated::SIGNATURE_HASH)
        })
        .find_map(|log| ISplitFactory::SplitCreated::decode_log_data(&log.data).ok())
}

/// An unsigned split deployment for the author's wallet to sign.
#[derive(Debug, Clone)]
pub struct SplitDeploymentRequest {
    /// The factory contract to call.
    pub to: Address,
    /// ABI-encoded `createSplit` calldata.
    pub calldata: Bytes,
    /// The canonical parameters the calldata encodes; persisted callers
    /// compare the eventual deployment against these.
    pub params: SplitParams,
}

/// Result of [`SplitEngine::get_or_create`].
#[derive(Debug, Clone)]
pub enum SplitAction {
    /// A split already exists for the author; no deployment needed.
    Existing(Address),
    /// No split exists; the author must sign and submit this deployment.
    Deploy(SplitDeploymentRequest),
}

/// The revenue split engine for one chain.
#[derive(Debug)]
pub struct SplitEngine<P> {
    provider: P,
    factory: Address,
    token: Address,
    platform_address: Address,
}

impl<P: EvmSettlementProvider> SplitEngine<P> {
    /// Creates a split engine.
    ///
    /// `factory` is the split deployment factory, `token` the currency
    /// being split, `platform_address` the platform's revenue wallet.
    pub const fn new(provider: P, factory: Address, token: Address, platform_address: Address) -> Self {
        Self {
            provider,
            factory,
            token,
            platform_address,
        }
    }

    /// Returns the author's existing split address, or the unsigned
    /// deployment they need to sign. Idempotent: an existing record
    /// short-circuits redeployment.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::InvalidAddress`] if an existing record's
    /// split address fails to parse.
    pub fn get_or_create(
        &self,
        existing: Option<&StoredSplit>,
        author: Address,
    ) -> Result<SplitAction, SplitError> {
        if let Some(stored) = existing {
            let address = parse_address(&stored.split_address)?;
            return Ok(SplitAction::Existing(address));
        }
        Ok(SplitAction::Deploy(self.deployment_request(author)))
    }

    /// Builds the unsigned `createSplit` deployment for an author. The
    /// author owns the resulting split.
    #[must_use]
    pub fn deployment_request(&self, author: Address) -> SplitDeploymentRequest {
        let params = two_party_params(author, self.platform_address);
        let call = ISplitFactory::createSplitCall {
            _splitParams: params.clone(),
            _owner: author,
            _creator: author,
        };
        SplitDeploymentRequest {
            to: self.factory,
            calldata: call.abi_encode().into(),
            params,
        }
    }

    /// Verifies a claimed split deployment against the on-chain event and
    /// returns the deployed split's address.
    ///
    /// Re-derives the canonical recipient/allocation arrays for the author
    /// and compares them against what the factory actually emitted.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError`] when the transaction is missing or reverted,
    /// carries no factory event, or the deployed parameters differ from
    /// the canonical ones.
    pub async fn verify_deployment(
        &self,
        tx_hash: TxHash,
        expected_author: Address,
    ) -> Result<Address, SplitError> {
        let receipt = self
            .provider
            .read_provider()
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| SplitError::Rpc(e.to_string()))?
            .ok_or(SplitError::DeploymentNotFound)?;
        if !receipt.status() {
            return Err(SplitError::Reverted);
        }
        let event =
            split_created_from_logs(receipt.inner.logs().iter().map(|l| &l.inner), self.factory)
                .ok_or(SplitError::EventMissing(self.factory))?;
        let expected = two_party_params(expected_author, self.platform_address);
        validate_params(&event.splitParams, &expected)?;
        tracing::info!(
            split = %event.split,
            author = %expected_author,
            tx = %tx_hash,
            "Verified split deployment"
        );
        Ok(event.split)
    }

    /// Pushes accumulated funds out of an author's split to both parties
    /// in one transaction.
    ///
    /// Parameters are rebuilt from the record's stored addresses and
    /// shares; the engine waits for the receipt before reporting success.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError`] when the record is inconsistent, sending
    /// fails, or the distribution transaction reverts.
    pub async fn distribute(&self, split: &StoredSplit) -> Result<TxHash, SplitError> {
        if u32::from(split.author_share_bps) + u32::from(split.platform_share_bps) != 10_000 {
            return Err(SplitError::InconsistentShares(
                split.author_share_bps,
                split.platform_share_bps,
            ));
        }
        let split_address = parse_address(&split.split_address)?;
        let author = parse_address(&split.author_address)?;
        let platform = parse_address(&split.platform_address)?;
        let params = split_params(
            author,
            split.author_share_bps,
            platform,
            split.platform_share_bps,
        );
        let call = ISplitWallet::distributeCall {
            _splitParams: params,
            _token: self.token,
            _distributor: self.provider.signer_address(),
        };
        let receipt = self
            .provider
            .send_transaction(MetaTransaction {
                to: split_address,
                calldata: call.abi_encode().into(),
                confirmations: 1,
            })
            .await
            .map_err(|e| SplitError::Settlement(e.to_string()))?;
        if !receipt.status() {
            return Err(SplitError::DistributionReverted(receipt.transaction_hash));
        }
        tracing::info!(
            split = %split_address,
            author = %author,
            tx = %receipt.transaction_hash,
            "Distributed split"
        );
        Ok(receipt.transaction_hash)
    }
}

fn parse_address(address: &str) -> Result<Address, SplitError> {
    address
        .parse()
        .map_err(|_| SplitError::InvalidAddress(address.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW: Address = Address::repeat_byte(0x11);
    const HIGH: Address = Address::repeat_byte(0xee);

    #[test]
    fn test_recipients_sorted_for_any_input_order() {
        let a = two_party_params(LOW, HIGH);
        let b = two_party_params(HIGH, LOW);
        assert_eq!(a.recipients, vec![LOW, HIGH]);
        assert_eq!(b.recipients, vec![LOW, HIGH]);
        // Allocations follow their recipients.
        assert_eq!(a.allocations, vec![U256::from(900_000u64), U256::from(100_000u64)]);
        assert_eq!(b.allocations, vec![U256::from(100_000u64), U256::from(900_000u64)]);
    }

    #[test]
    fn test_allocations_sum_to_total() {
        let params = two_party_params(LOW, HIGH);
        let sum: U256 = params.allocations.iter().copied().sum();
        assert_eq!(sum, params.totalAllocation);
        assert_eq!(params.totalAllocation, U256::from(TOTAL_ALLOCATION));
        assert_eq!(params.distributionIncentive, DISTRIBUTION_INCENTIVE);
    }

    #[test]
    fn test_validate_accepts_canonical_params() {
        let expected = two_party_params(LOW, HIGH);
        let actual = expected.clone();
        assert!(validate_params(&actual, &expected).is_ok());
    }

    #[test]
    fn test_unsorted_recipients_rejected_even_with_correct_parties() {
        // The party set is right, the ordering is not: still a mismatch,
        // because strict ordering is part of the validated contract.
        let expected = two_party_params(LOW, HIGH);
        let actual = SplitParams {
            recipients: vec![HIGH, LOW],
            allocations: vec![U256::from(100_000u64), U256::from(900_000u64)],
            totalAllocation: U256::from(TOTAL_ALLOCATION),
            distributionIncentive: DISTRIBUTION_INCENTIVE,
        };
        assert!(matches!(
            validate_params(&actual, &expected),
            Err(SplitError::RecipientMismatch)
        ));
    }

    #[test]
    fn test_wrong_allocations_rejected() {
        let expected = two_party_params(LOW, HIGH);
        let mut actual = expected.clone();
        actual.allocations = vec![U256::from(800_000u64), U256::from(200_000u64)];
        assert!(matches!(
            validate_params(&actual, &expected),
            Err(SplitError::AllocationMismatch)
        ));
    }

    #[test]
    fn test_extra_recipient_rejected() {
        let expected = two_party_params(LOW, HIGH);
        let mut actual = expected.clone();
        actual.recipients.push(Address::repeat_byte(0x33));
        actual.allocations.push(U256::ZERO);
        assert!(matches!(
            validate_params(&actual, &expected),
            Err(SplitError::RecipientMismatch)
        ));
    }

    #[test]
    fn test_split_created_event_roundtrip() {
        let factory = Address::repeat_byte(0xfa);
        let split = Address::repeat_byte(0x5b);
        let event = ISplitFactory::SplitCreated {
            split,
            splitParams: two_party_params(LOW, HIGH),
            owner: LOW,
            creator: LOW,
        };
        let log = alloy_primitives::Log {
            address: factory,
            data: event.encode_log_data(),
        };
        let decoded = split_created_from_logs([&log].into_iter(), factory).unwrap();
        assert_eq!(decoded.split, split);
        assert_eq!(decoded.splitParams, two_party_params(LOW, HIGH));
    }

    #[test]
    fn test_event_from_other_contract_is_ignored() {
        let factory = Address::repeat_byte(0xfa);
        let event = ISplitFactory::SplitCreated {
            split: Address::repeat_byte(0x5b),
            splitParams: two_party_params(LOW, HIGH),
            owner: LOW,
            creator: LOW,
        };
        let log = alloy_primitives::Log {
            address: Address::repeat_byte(0x99),
            data: event.encode_log_data(),
        };
        assert!(split_created_from_logs([&log].into_iter(), factory).is_none());
    }

    #[test]
    fn test_deployment_calldata_roundtrip() {
        let call = ISplitFactory::createSplitCall {
            _splitParams: two_party_params(LOW, HIGH),
            _owner: LOW,
            _creator: LOW,
        };
        let calldata = call.abi_encode();
        let decoded = ISplitFactory::createSplitCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded._splitParams, two_party_params(LOW, HIGH));
        assert_eq!(decoded._owner, LOW);
    }

    #[test]
    fn test_split_error_maps_to_taxonomy() {
        let err: VerificationError = SplitError::RecipientMismatch.into();
        assert_eq!(err.reason(), clawpay::ErrorReason::RecipientMismatch);
        let err: VerificationError = SplitError::AllocationMismatch.into();
        assert_eq!(err.reason(), clawpay::ErrorReason::AllocationMismatch);
    }
}
