//! SPL token transfer and memo extraction from confirmed transactions.
//!
//! Payments arrive as ordinary user-submitted transactions, frequently
//! composed by wallets or routers, so the transfer we care about can sit
//! at the top level or inside an inner-instruction trace. The parser
//! walks both scopes, classifies SPL Token / Token-2022 `Transfer` and
//! `TransferChecked` instructions into [`TokenTransfer`]s, and picks up
//! the first memo-program instruction as the payment memo.
//!
//! For a plain `Transfer` the instruction does not name the mint; it is
//! resolved from the transaction's token-balance records instead, which
//! also supply the owning wallet of the destination token account.

use std::collections::HashMap;
use std::str::FromStr;

use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use solana_transaction_status_client_types::option_serializer::OptionSerializer;
use solana_transaction_status_client_types::{
    EncodedConfirmedTransactionWithStatusMeta, TransactionConfirmationStatus, UiInstruction,
    UiInnerInstructions, UiTransactionStatusMeta,
};
use spl_token::instruction::TokenInstruction;

use clawpay::chain::Chain;
use clawpay::error::VerificationError;
use clawpay::types::{ConfirmationStatus, PaymentRecord, TokenTransfer};
use clawpay::verify::ChainPaymentParser;

use crate::networks::{MEMO_PROGRAM_ID, MEMO_V1_PROGRAM_ID};
use crate::provider::SolanaRpcPool;

/// Errors turning a fetched Solana record into a [`PaymentRecord`].
#[derive(Debug, thiserror::Error)]
pub enum SolanaParseError {
    /// The reference string is not a valid transaction signature.
    #[error("Invalid transaction signature: {0}")]
    InvalidSignature(String),
    /// The RPC returned a payload this parser cannot decode.
    #[error("Transaction payload could not be decoded")]
    UnsupportedEncoding,
    /// The record carries no status metadata.
    #[error("Transaction record is missing status metadata")]
    MissingMeta,
    /// An account key in the record failed to parse.
    #[error("Invalid account key in transaction record: {0}")]
    BadAccountKey(String),
    /// The transaction executed with an error on chain.
    #[error("{0}")]
    ExecutionFailed(String),
}

impl From<SolanaParseError> for VerificationError {
    fn from(e: SolanaParseError) -> Self {
        match e {
            // A reference that cannot be a signature cannot exist on chain.
            SolanaParseError::InvalidSignature(_) => Self::TransactionNotFound,
            SolanaParseError::ExecutionFailed(msg) => Self::TransactionFailed(msg),
            SolanaParseError::UnsupportedEncoding
            | SolanaParseError::MissingMeta
            | SolanaParseError::BadAccountKey(_) => Self::StatusUnknown(e.to_string()),
        }
    }
}

/// The Solana implementation of [`ChainPaymentParser`].
#[derive(Debug)]
pub struct SolanaPaymentParser {
    pool: SolanaRpcPool,
}

impl SolanaPaymentParser {
    /// Creates a parser over an RPC pool.
    #[must_use]
    pub const fn new(pool: SolanaRpcPool) -> Self {
        Self { pool }
    }
}

impl ChainPaymentParser for SolanaPaymentParser {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn fetch_payment(&self, reference: &str) -> Result<PaymentRecord, VerificationError> {
        let signature = parse_signature(reference)?;
        // Existence and on-chain success come from the status query, so a
        // lagging endpoint's getTransaction miss is a failover, not a
        // false "not found".
        let status = self
            .pool
            .signature_status(&signature)
            .await?
            .ok_or(VerificationError::TransactionNotFound)?;
        if let Some(err) = status.err {
            return Err(VerificationError::TransactionFailed(err.to_string()));
        }
        let encoded = self.pool.confirmed_transaction(&signature).await?;
        Ok(parse_confirmed(&encoded)?)
    }

    async fn confirmation_status(
        &self,
        reference: &str,
    ) -> Result<ConfirmationStatus, VerificationError> {
        let signature = parse_signature(reference)?;
        let status = self
            .pool
            .signature_status(&signature)
            .await?
            .ok_or(VerificationError::TransactionNotFound)?;
        match status.confirmation_status {
            Some(TransactionConfirmationStatus::Finalized) => Ok(ConfirmationStatus::Finalized),
            Some(TransactionConfirmationStatus::Confirmed) => Ok(ConfirmationStatus::Confirmed),
            Some(TransactionConfirmationStatus::Processed) => Ok(ConfirmationStatus::Processed),
            None => Err(VerificationError::StatusUnknown(
                "chain did not report a confirmation level".into(),
            )),
        }
    }
}

fn parse_signature(reference: &str) -> Result<Signature, SolanaParseError> {
    Signature::from_str(reference)
        .map_err(|_| SolanaParseError::InvalidSignature(reference.to_owned()))
}

/// Turns a fetched confirmed transaction into a [`PaymentRecord`].
///
/// # Errors
///
/// Returns [`SolanaParseError`] when the record cannot be decoded or the
/// transaction executed with an error.
pub fn parse_confirmed(
    encoded: &EncodedConfirmedTransactionWithStatusMeta,
) -> Result<PaymentRecord, SolanaParseError> {
    let transaction = encoded
        .transaction
        .transaction
        .decode()
        .ok_or(SolanaParseError::UnsupportedEncoding)?;
    let meta = encoded
        .transaction
        .meta
        .as_ref()
        .ok_or(SolanaParseError::MissingMeta)?;
    if let Some(err) = &meta.err {
        return Err(SolanaParseError::ExecutionFailed(err.to_string()));
    }

    let keys = resolve_account_keys(&transaction, meta)?;
    let balances = TokenBalanceIndex::from_meta(meta);
    let instructions = flatten_instructions(&transaction, meta);
    Ok(extract_payment(&instructions, &keys, &balances))
}

/// An instruction in either scope, with indexes into the resolved account
/// key list.
#[derive(Debug, Clone)]
struct RawInstruction {
    program_id_index: u8,
    accounts: Vec<u8>,
    data: Vec<u8>,
}

/// Combines static account keys with the address-table addresses the
/// transaction loaded, in on-chain resolution order (static, then loaded
/// writable, then loaded readonly).
fn resolve_account_keys(
    transaction: &VersionedTransaction,
    meta: &UiTransactionStatusMeta,
) -> Result<Vec<Pubkey>, SolanaParseError> {
    let mut keys: Vec<Pubkey> = transaction.message.static_account_keys().to_vec();
    if let OptionSerializer::Some(loaded) = &meta.loaded_addresses {
        for address in loaded.writable.iter().chain(loaded.readonly.iter()) {
            let key = Pubkey::from_str(address)
                .map_err(|_| SolanaParseError::BadAccountKey(address.clone()))?;
            keys.push(key);
        }
    }
    Ok(keys)
}

/// Collects top-level instructions followed by every inner instruction.
fn flatten_instructions(
    transaction: &VersionedTransaction,
    meta: &UiTransactionStatusMeta,
) -> Vec<RawInstruction> {
    let mut instructions: Vec<RawInstruction> = transaction
        .message
        .instructions()
        .iter()
        .map(|ix| RawInstruction {
            program_id_index: ix.program_id_index,
            accounts: ix.accounts.clone(),
            data: ix.data.clone(),
        })
        .collect();
    if let OptionSerializer::Some(inner) = &meta.inner_instructions {
        collect_inner(inner, &mut instructions);
    }
    instructions
}

fn collect_inner(inner: &[UiInnerInstructions], out: &mut Vec<RawInstruction>) {
    for group in inner {
        for instruction in &group.instructions {
            // Base64-fetched transactions carry inner instructions in
            // compiled form; a jsonParsed variant would need its own path.
            let UiInstruction::Compiled(compiled) = instruction else {
                tracing::debug!(index = group.index, "Skipping non-compiled inner instruction");
                continue;
            };
            let Ok(data) = bs58::decode(&compiled.data).into_vec() else {
                tracing::debug!(index = group.index, "Skipping undecodable inner instruction");
                continue;
            };
            out.push(RawInstruction {
                program_id_index: compiled.program_id_index,
                accounts: compiled.accounts.clone(),
                data,
            });
        }
    }
}

/// Mint and owner of token accounts touched by the transaction, keyed by
/// account index.
#[derive(Debug, Default)]
struct TokenBalanceIndex {
    entries: HashMap<u8, (String, Option<String>)>,
}

impl TokenBalanceIndex {
    fn from_meta(meta: &UiTransactionStatusMeta) -> Self {
        let mut index = Self::default();
        // Post-balances first: the destination may only exist after the
        // transaction. Pre-balances fill accounts emptied by it.
        if let OptionSerializer::Some(balances) = &meta.post_token_balances {
            index.extend(balances.iter().map(|b| {
                (
                    b.account_index,
                    b.mint.clone(),
                    Option::<String>::from(b.owner.clone()),
                )
            }));
        }
        if let OptionSerializer::Some(balances) = &meta.pre_token_balances {
            index.extend(balances.iter().map(|b| {
                (
                    b.account_index,
                    b.mint.clone(),
                    Option::<String>::from(b.owner.clone()),
                )
            }));
        }
        index
    }

    fn extend(&mut self, entries: impl Iterator<Item = (u8, String, Option<String>)>) {
        for (account_index, mint, owner) in entries {
            self.entries.entry(account_index).or_insert((mint, owner));
        }
    }

    fn mint(&self, account_index: u8) -> Option<&str> {
        self.entries.get(&account_index).map(|(mint, _)| mint.as_str())
    }

    fn owner(&self, account_index: u8) -> Option<&str> {
        self.entries
            .get(&account_index)
            .and_then(|(_, owner)| owner.as_deref())
    }
}

/// Extracts every classifiable transfer and the first memo string.
fn extract_payment(
    instructions: &[RawInstruction],
    keys: &[Pubkey],
    balances: &TokenBalanceIndex,
) -> PaymentRecord {
    let mut transfers = Vec::new();
    let mut memo = None;
    for instruction in instructions {
        let Some(program_id) = keys.get(instruction.program_id_index as usize) else {
            continue;
        };
        if *program_id == spl_token::ID || *program_id == spl_token_2022::ID {
            if let Some(transfer) = classify_transfer(instruction, keys, balances) {
                transfers.push(transfer);
            }
        } else if memo.is_none()
            && (*program_id == MEMO_PROGRAM_ID || *program_id == MEMO_V1_PROGRAM_ID)
        {
            memo = String::from_utf8(instruction.data.clone()).ok();
        }
    }
    PaymentRecord { transfers, memo }
}

/// Classifies a token-program instruction as a transfer, if it is one.
///
/// `Transfer` and `TransferChecked` share their layout between SPL Token
/// and Token-2022, so one unpack covers both programs.
fn classify_transfer(
    instruction: &RawInstruction,
    keys: &[Pubkey],
    balances: &TokenBalanceIndex,
) -> Option<TokenTransfer> {
    let key_at = |position: usize| -> Option<(u8, &Pubkey)> {
        let index = *instruction.accounts.get(position)?;
        Some((index, keys.get(index as usize)?))
    };
    match TokenInstruction::unpack(&instruction.data).ok()? {
        TokenInstruction::Transfer { amount } => {
            // Accounts: [source, destination, authority]
            let (destination_index, destination_key) = key_at(1)?;
            let (_, authority_key) = key_at(2)?;
            let mint = balances.mint(destination_index)?;
            Some(TokenTransfer {
                source: authority_key.to_string(),
                destination: destination_key.to_string(),
                destination_owner: balances.owner(destination_index).map(str::to_owned),
                amount_raw: amount,
                mint: mint.to_owned(),
            })
        }
        TokenInstruction::TransferChecked { amount, .. } => {
            // Accounts: [source, mint, destination, authority]
            let (_, mint_key) = key_at(1)?;
            let (destination_index, destination_key) = key_at(2)?;
            let (_, authority_key) = key_at(3)?;
            Some(TokenTransfer {
                source: authority_key.to_string(),
                destination: destination_key.to_string(),
                destination_owner: balances.owner(destination_index).map(str::to_owned),
                amount_raw: amount,
                mint: mint_key.to_string(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMOUNT: u64 = 250_000;

    fn keys() -> Vec<Pubkey> {
        vec![
            Pubkey::new_unique(), // 0: payer / authority
            Pubkey::new_unique(), // 1: source token account
            Pubkey::new_unique(), // 2: destination token account
            Pubkey::new_unique(), // 3: mint
            spl_token::ID,        // 4: token program
            MEMO_PROGRAM_ID,      // 5: memo program
        ]
    }

    fn transfer_checked_ix() -> RawInstruction {
        RawInstruction {
            program_id_index: 4,
            accounts: vec![1, 3, 2, 0],
            data: TokenInstruction::TransferChecked {
                amount: AMOUNT,
                decimals: 6,
            }
            .pack(),
        }
    }

    fn plain_transfer_ix() -> RawInstruction {
        RawInstruction {
            program_id_index: 4,
            accounts: vec![1, 2, 0],
            data: TokenInstruction::Transfer { amount: AMOUNT }.pack(),
        }
    }

    fn memo_ix(text: &str) -> RawInstruction {
        RawInstruction {
            program_id_index: 5,
            accounts: vec![],
            data: text.as_bytes().to_vec(),
        }
    }

    fn balances_with(keys: &[Pubkey], owner: &Pubkey) -> TokenBalanceIndex {
        let mut balances = TokenBalanceIndex::default();
        balances.extend(
            [(2u8, keys[3].to_string(), Some(owner.to_string()))].into_iter(),
        );
        balances
    }

    #[test]
    fn test_transfer_checked_extraction() {
        let keys = keys();
        let owner = Pubkey::new_unique();
        let record = extract_payment(
            &[transfer_checked_ix()],
            &keys,
            &balances_with(&keys, &owner),
        );
        assert_eq!(record.transfers.len(), 1);
        let transfer = &record.transfers[0];
        assert_eq!(transfer.amount_raw, AMOUNT);
        assert_eq!(transfer.source, keys[0].to_string());
        assert_eq!(transfer.destination, keys[2].to_string());
        assert_eq!(transfer.destination_owner.as_deref(), Some(owner.to_string().as_str()));
        assert_eq!(transfer.mint, keys[3].to_string());
    }

    #[test]
    fn test_plain_transfer_resolves_mint_from_balances() {
        let keys = keys();
        let owner = Pubkey::new_unique();
        let record =
            extract_payment(&[plain_transfer_ix()], &keys, &balances_with(&keys, &owner));
        assert_eq!(record.transfers.len(), 1);
        assert_eq!(record.transfers[0].mint, keys[3].to_string());
    }

    #[test]
    fn test_plain_transfer_without_balance_entry_is_skipped() {
        let keys = keys();
        let record = extract_payment(&[plain_transfer_ix()], &keys, &TokenBalanceIndex::default());
        assert!(record.transfers.is_empty());
    }

    #[test]
    fn test_non_transfer_token_instruction_is_ignored() {
        let keys = keys();
        let close = RawInstruction {
            program_id_index: 4,
            accounts: vec![1, 0, 0],
            data: TokenInstruction::CloseAccount.pack(),
        };
        let owner = Pubkey::new_unique();
        let record = extract_payment(&[close], &keys, &balances_with(&keys, &owner));
        assert!(record.transfers.is_empty());
    }

    #[test]
    fn test_non_token_program_is_ignored() {
        let mut keys = keys();
        keys[4] = Pubkey::new_unique(); // not the token program
        let owner = Pubkey::new_unique();
        let record = extract_payment(
            &[transfer_checked_ix()],
            &keys,
            &balances_with(&keys, &owner),
        );
        assert!(record.transfers.is_empty());
    }

    #[test]
    fn test_memo_extraction() {
        let keys = keys();
        let owner = Pubkey::new_unique();
        let record = extract_payment(
            &[
                memo_ix("clawstack:post-abc:1706960000"),
                transfer_checked_ix(),
            ],
            &keys,
            &balances_with(&keys, &owner),
        );
        assert_eq!(
            record.memo.as_deref(),
            Some("clawstack:post-abc:1706960000")
        );
        assert_eq!(record.transfers.len(), 1);
    }

    #[test]
    fn test_first_memo_wins() {
        let keys = keys();
        let record = extract_payment(
            &[memo_ix("first"), memo_ix("second")],
            &keys,
            &TokenBalanceIndex::default(),
        );
        assert_eq!(record.memo.as_deref(), Some("first"));
    }

    #[test]
    fn test_missing_memo_is_none() {
        let keys = keys();
        let owner = Pubkey::new_unique();
        let record = extract_payment(
            &[transfer_checked_ix()],
            &keys,
            &balances_with(&keys, &owner),
        );
        assert_eq!(record.memo, None);
    }

    #[test]
    fn test_inner_instructions_are_scanned() {
        use solana_transaction_status_client_types::UiCompiledInstruction;

        let keys = keys();
        let owner = Pubkey::new_unique();
        let checked = transfer_checked_ix();
        let inner = vec![UiInnerInstructions {
            index: 0,
            instructions: vec![UiInstruction::Compiled(UiCompiledInstruction {
                program_id_index: checked.program_id_index,
                accounts: checked.accounts.clone(),
                data: bs58::encode(&checked.data).into_string(),
                stack_height: Some(2),
            })],
        }];
        let mut instructions = Vec::new();
        collect_inner(&inner, &mut instructions);
        let record = extract_payment(&instructions, &keys, &balances_with(&keys, &owner));
        assert_eq!(record.transfers.len(), 1);
        assert_eq!(record.transfers[0].amount_raw, AMOUNT);
    }

    #[test]
    fn test_invalid_signature_maps_to_not_found() {
        let err: VerificationError =
            SolanaParseError::InvalidSignature("nope".into()).into();
        assert_eq!(err, VerificationError::TransactionNotFound);
    }
}
