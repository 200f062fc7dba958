//! Ordered-fallback Solana RPC endpoint pool.
//!
//! Transaction lookups go through a list of HTTP endpoints in strict
//! priority order (primary, fallbacks, public). Individual endpoint
//! failures are logged and swallowed; only after every endpoint has failed
//! in every retry round does the pool give up. The retry schedule is an
//! explicit bounded loop with a fixed backoff sequence — exhausting the
//! schedule is always visible in the error.
//!
//! Endpoints are tried sequentially, never raced, to keep per-provider
//! quota usage predictable.

use std::time::Duration;

use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_commitment_config::CommitmentConfig;
use solana_signature::Signature;
use solana_transaction_status_client_types::{
    EncodedConfirmedTransactionWithStatusMeta, TransactionStatus, UiTransactionEncoding,
};

use clawpay::error::VerificationError;

/// Default per-request timeout for a single endpoint.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default backoff between full endpoint passes. Two retry rounds: half a
/// second, then two seconds.
pub const DEFAULT_BACKOFF: [Duration; 2] = [Duration::from_millis(500), Duration::from_secs(2)];

/// Errors from the RPC pool.
#[derive(Debug, thiserror::Error)]
pub enum RpcPoolError {
    /// The pool was constructed with no endpoints.
    #[error("No RPC endpoints configured")]
    NoEndpoints,
    /// Every endpoint failed in every retry round.
    #[error("All {attempts} RPC attempts across {endpoints} endpoints failed; last error: {last}")]
    Exhausted {
        /// Number of configured endpoints.
        endpoints: usize,
        /// Total attempts made across all rounds.
        attempts: usize,
        /// The last endpoint error observed.
        last: String,
    },
}

impl From<RpcPoolError> for VerificationError {
    fn from(e: RpcPoolError) -> Self {
        Self::StatusUnknown(e.to_string())
    }
}

struct Endpoint {
    url: String,
    client: RpcClient,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").field("url", &self.url).finish()
    }
}

/// A prioritized pool of Solana RPC endpoints.
///
/// Lookups are idempotent and infrequent, so the pool carries no cache;
/// the chain itself is the source of truth.
#[derive(Debug)]
pub struct SolanaRpcPool {
    endpoints: Vec<Endpoint>,
    backoff: Vec<Duration>,
}

impl SolanaRpcPool {
    /// Creates a pool from endpoint URLs in priority order, with the
    /// default request timeout and backoff schedule.
    ///
    /// # Errors
    ///
    /// Returns [`RpcPoolError::NoEndpoints`] if `urls` is empty.
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> Result<Self, RpcPoolError> {
        Self::with_schedule(urls, DEFAULT_REQUEST_TIMEOUT, DEFAULT_BACKOFF.to_vec())
    }

    /// Creates a pool with an explicit request timeout and backoff schedule.
    ///
    /// An empty `backoff` means a single pass over the endpoints with no
    /// retry rounds.
    ///
    /// # Errors
    ///
    /// Returns [`RpcPoolError::NoEndpoints`] if `urls` is empty.
    pub fn with_schedule<S: AsRef<str>>(
        urls: &[S],
        request_timeout: Duration,
        backoff: Vec<Duration>,
    ) -> Result<Self, RpcPoolError> {
        if urls.is_empty() {
            return Err(RpcPoolError::NoEndpoints);
        }
        let endpoints = urls
            .iter()
            .map(|url| Endpoint {
                url: url.as_ref().to_owned(),
                client: RpcClient::new_with_timeout_and_commitment(
                    url.as_ref().to_owned(),
                    request_timeout,
                    CommitmentConfig::confirmed(),
                ),
            })
            .collect();
        Ok(Self { endpoints, backoff })
    }

    /// Number of configured endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Fetches the status of a transaction signature, searching the full
    /// transaction history.
    ///
    /// `Ok(None)` means the chain has never seen the signature — distinct
    /// from [`RpcPoolError::Exhausted`], where the chain could not answer.
    ///
    /// # Errors
    ///
    /// Returns [`RpcPoolError`] when every endpoint is exhausted.
    pub async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionStatus>, RpcPoolError> {
        let signature = *signature;
        let statuses = self
            .with_fallback("getSignatureStatuses", async move |client: &RpcClient| {
                client
                    .get_signature_statuses_with_history(std::slice::from_ref(&signature))
                    .await
            })
            .await?;
        Ok(statuses.value.into_iter().next().flatten())
    }

    /// Fetches a confirmed transaction with its status metadata, base64
    /// encoded, accepting versioned (v0) transactions.
    ///
    /// # Errors
    ///
    /// Returns [`RpcPoolError`] when every endpoint is exhausted — which
    /// includes the case where no endpoint knows the signature, so callers
    /// should establish existence via [`signature_status`](Self::signature_status)
    /// first.
    pub async fn confirmed_transaction(
        &self,
        signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta, RpcPoolError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let signature = *signature;
        self.with_fallback("getTransaction", async move |client: &RpcClient| {
            client.get_transaction_with_config(&signature, config).await
        })
        .await
    }

    /// Runs an RPC call against each endpoint in priority order, retrying
    /// full passes per the backoff schedule.
    async fn with_fallback<T>(
        &self,
        method: &'static str,
        call: impl AsyncFn(&RpcClient) -> Result<T, ClientError>,
    ) -> Result<T, RpcPoolError> {
        let rounds = self.backoff.len() + 1;
        let mut attempts = 0usize;
        let mut last = String::new();
        for round in 0..rounds {
            if round > 0 {
                tokio::time::sleep(self.backoff[round - 1]).await;
            }
            for endpoint in &self.endpoints {
                attempts += 1;
                match call(&endpoint.client).await {
                    Ok(value) => {
                        if attempts > 1 {
                            tracing::debug!(
                                method,
                                url = %endpoint.url,
                                attempts,
                                "RPC call succeeded after fallback"
                            );
                        }
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!(
                            method,
                            url = %endpoint.url,
                            round,
                            error = %e,
                            "RPC endpoint failed"
                        );
                        last = e.to_string();
                    }
                }
            }
        }
        Err(RpcPoolError::Exhausted {
            endpoints: self.endpoints.len(),
            attempts,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_rejected() {
        let urls: [&str; 0] = [];
        assert!(matches!(
            SolanaRpcPool::from_urls(&urls),
            Err(RpcPoolError::NoEndpoints)
        ));
    }

    #[test]
    fn test_pool_preserves_priority_order() {
        let pool =
            SolanaRpcPool::from_urls(&["https://primary.example", "https://fallback.example"])
                .unwrap();
        assert_eq!(pool.endpoint_count(), 2);
        assert_eq!(pool.endpoints[0].url, "https://primary.example");
        assert_eq!(pool.endpoints[1].url, "https://fallback.example");
    }

    #[test]
    fn test_exhausted_error_is_status_unknown() {
        let err: VerificationError = RpcPoolError::Exhausted {
            endpoints: 2,
            attempts: 6,
            last: "connection refused".into(),
        }
        .into();
        assert!(matches!(err, VerificationError::StatusUnknown(_)));
        assert_eq!(err.reason(), clawpay::ErrorReason::StatusUnknown);
    }
}
