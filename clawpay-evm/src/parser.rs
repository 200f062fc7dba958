//! ERC-20 payment extraction from Base transaction receipts.
//!
//! On Base a payment is an ordinary ERC-20 transfer — either straight to
//! the platform treasury (spam deposits) or into the author's split
//! contract (content payments). The receipt's `Transfer` logs carry
//! everything the chain-agnostic pipeline needs; there is no memo on EVM,
//! correlation is the caller's resource binding.
//!
//! Finality: a receipt in a block is `confirmed`; once the chain's
//! finalized head has passed that block it is `finalized`.

use alloy_primitives::{Address, Log, TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionReceipt};
use alloy_sol_types::SolEvent;

use clawpay::chain::Chain;
use clawpay::error::VerificationError;
use clawpay::types::{ConfirmationStatus, PaymentRecord, TokenTransfer};
use clawpay::verify::ChainPaymentParser;

use crate::contract::IERC20;
use crate::networks::canonical_address;

/// The Base implementation of [`ChainPaymentParser`].
#[derive(Debug)]
pub struct EvmPaymentParser<P> {
    provider: P,
    token: Address,
}

impl<P: Provider> EvmPaymentParser<P> {
    /// Creates a parser reading receipts through `provider`, extracting
    /// transfers of `token`.
    pub const fn new(provider: P, token: Address) -> Self {
        Self { provider, token }
    }

    async fn receipt(&self, reference: &str) -> Result<TransactionReceipt, VerificationError> {
        // A reference that cannot be a transaction hash cannot exist on chain.
        let hash: TxHash = reference
            .parse()
            .map_err(|_| VerificationError::TransactionNotFound)?;
        self.provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| VerificationError::StatusUnknown(e.to_string()))?
            .ok_or(VerificationError::TransactionNotFound)
    }
}

impl<P: Provider + Send + Sync> ChainPaymentParser for EvmPaymentParser<P> {
    fn chain(&self) -> Chain {
        Chain::Base
    }

    async fn fetch_payment(&self, reference: &str) -> Result<PaymentRecord, VerificationError> {
        let receipt = self.receipt(reference).await?;
        if !receipt.status() {
            return Err(VerificationError::TransactionFailed(
                "transaction reverted".into(),
            ));
        }
        let transfers =
            transfers_from_logs(receipt.inner.logs().iter().map(|l| &l.inner), self.token);
        Ok(PaymentRecord {
            transfers,
            memo: None,
        })
    }

    async fn confirmation_status(
        &self,
        reference: &str,
    ) -> Result<ConfirmationStatus, VerificationError> {
        let receipt = self.receipt(reference).await?;
        let Some(block_number) = receipt.block_number else {
            return Ok(ConfirmationStatus::Processed);
        };
        let finalized = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Finalized)
            .await
            .map_err(|e| VerificationError::StatusUnknown(e.to_string()))?;
        let status = match finalized {
            Some(block) if block.header.number >= block_number => ConfirmationStatus::Finalized,
            _ => ConfirmationStatus::Confirmed,
        };
        Ok(status)
    }
}

/// Decodes every `Transfer` log emitted by `token` into a [`TokenTransfer`].
///
/// Values beyond u64 cannot be a USDC payment and are skipped.
pub fn transfers_from_logs<'a>(
    logs: impl Iterator<Item = &'a Log>,
    token: Address,
) -> Vec<TokenTransfer> {
    logs.filter(|log| log.address == token)
        .filter(|log| log.data.topics().first() == Some(&IERC20::Transfer::SIGNATURE_HASH))
        .filter_map(|log| {
            let event = IERC20::Transfer::decode_log_data(&log.data).ok()?;
            let amount_raw: u64 = match u64::try_from(event.value) {
                Ok(amount) => amount,
                Err(_) => {
                    tracing::warn!(value = %event.value, "Transfer value exceeds u64, skipping");
                    return None;
                }
            };
            Some(TokenTransfer {
                source: canonical_address(&event.from),
                destination: canonical_address(&event.to),
                destination_owner: None,
                amount_raw,
                mint: canonical_address(&token),
            })
        })
        .collect()
}
