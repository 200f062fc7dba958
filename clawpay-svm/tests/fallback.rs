//! RPC pool fallback behavior against mocked JSON-RPC endpoints.

use std::str::FromStr;
use std::time::Duration;

use solana_signature::Signature;
use solana_transaction_status_client_types::TransactionConfirmationStatus;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use clawpay_svm::{RpcPoolError, SolanaRpcPool};

fn finalized_status_body() -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "result": {
            "context": { "slot": 100 },
            "value": [{
                "slot": 100,
                "confirmations": null,
                "err": null,
                "status": { "Ok": null },
                "confirmationStatus": "finalized"
            }]
        },
        "id": 1
    })
}

async fn failing_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(finalized_status_body()))
        .mount(&server)
        .await;
    server
}

fn test_signature() -> Signature {
    Signature::from_str(
        "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW",
    )
    .unwrap()
}

#[tokio::test]
async fn falls_back_to_next_endpoint_when_primary_fails() {
    let bad = failing_server().await;
    let good = healthy_server().await;

    let pool = SolanaRpcPool::with_schedule(
        &[bad.uri(), good.uri()],
        Duration::from_secs(2),
        Vec::new(),
    )
    .unwrap();

    let status = pool
        .signature_status(&test_signature())
        .await
        .unwrap()
        .expect("signature should be known");
    assert_eq!(
        status.confirmation_status,
        Some(TransactionConfirmationStatus::Finalized)
    );
}

#[tokio::test]
async fn primary_endpoint_answer_wins_when_healthy() {
    let good = healthy_server().await;
    let bad = failing_server().await;

    let pool = SolanaRpcPool::with_schedule(
        &[good.uri(), bad.uri()],
        Duration::from_secs(2),
        Vec::new(),
    )
    .unwrap();

    let status = pool.signature_status(&test_signature()).await.unwrap();
    assert!(status.is_some());
    // The fallback endpoint was never consulted.
    assert!(bad.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn exhausting_every_endpoint_and_round_errors() {
    let bad_a = failing_server().await;
    let bad_b = failing_server().await;

    let pool = SolanaRpcPool::with_schedule(
        &[bad_a.uri(), bad_b.uri()],
        Duration::from_secs(2),
        vec![Duration::from_millis(10)],
    )
    .unwrap();

    let err = pool.signature_status(&test_signature()).await.unwrap_err();
    match err {
        RpcPoolError::Exhausted {
            endpoints,
            attempts,
            ..
        } => {
            assert_eq!(endpoints, 2);
            // Two endpoints, one initial pass plus one retry round.
            assert_eq!(attempts, 4);
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    // Both endpoints saw both rounds.
    assert_eq!(bad_a.received_requests().await.unwrap().len(), 2);
    assert_eq!(bad_b.received_requests().await.unwrap().len(), 2);
}
