//! EvmClient behavior against a mocked JSON-RPC node
//!
//! Covers:
//! - Typed decoding of quantities, balances and receipts
//! - Retries on transient failures and no retries on permanent ones
//! - Single-attempt broadcast
//! - Endpoint failover
//! - Connectivity checks

use alloy::primitives::{address, Bytes, B256, U256};
use chainpay_provider::{CallRequest, EvmClient, ProviderConfig, ProviderError};
use chainpay_resilience::RetryPolicy;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_err(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0", "id": 1, "error": {"code": code, "message": message}
    }))
}

fn fast_config(urls: &[String]) -> ProviderConfig {
    ProviderConfig::from_urls(urls)
        .unwrap()
        .with_retry(
            RetryPolicy::new()
                .with_base_delay(Duration::from_millis(1))
                .with_jitter(0.0),
        )
        .with_rate_limit(None)
        .with_timeout(Duration::from_secs(5))
}

async fn client_for(server: &MockServer) -> EvmClient {
    EvmClient::new("base_sepolia", fast_config(&[server.uri()])).unwrap()
}

async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

// ============================================================================
// Typed reads
// ============================================================================

mod read_tests {
    use super::*;

    #[tokio::test]
    async fn test_block_number_and_chain_id() {
        let server = MockServer::start().await;
        mount(&server, "eth_blockNumber", ok(json!("0x1b4"))).await;
        mount(&server, "eth_chainId", ok(json!("0x14a34"))).await;

        let client = client_for(&server).await;
        assert_eq!(client.block_number().await.unwrap(), 436);
        assert_eq!(client.chain_id().await.unwrap(), 84532);
    }

    #[tokio::test]
    async fn test_native_balance() {
        let server = MockServer::start().await;
        mount(&server, "eth_getBalance", ok(json!("0xde0b6b3a7640000"))).await;

        let client = client_for(&server).await;
        let balance = client
            .get_balance(address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"))
            .await
            .unwrap();
        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u128));
    }

    #[tokio::test]
    async fn test_token_balance_via_eth_call() {
        let server = MockServer::start().await;
        let word = format!("0x{:064x}", 2_500_000u64);
        mount(&server, "eth_call", ok(json!(word))).await;

        let client = client_for(&server).await;
        let balance = client
            .get_token_balance(
                address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
                address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            )
            .await
            .unwrap();
        assert_eq!(balance, U256::from(2_500_000u64));
    }

    #[tokio::test]
    async fn test_gas_price_estimate_and_nonce() {
        let server = MockServer::start().await;
        mount(&server, "eth_gasPrice", ok(json!("0x3b9aca00"))).await;
        mount(&server, "eth_estimateGas", ok(json!("0x5208"))).await;
        mount(&server, "eth_getTransactionCount", ok(json!("0x7"))).await;

        let client = client_for(&server).await;
        let to = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        assert_eq!(client.gas_price().await.unwrap(), 1_000_000_000);
        assert_eq!(
            client.estimate_gas(&CallRequest::new(to).value(U256::from(1u64))).await.unwrap(),
            21_000
        );
        assert_eq!(client.transaction_count(to).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_unknown_receipt_and_transaction() {
        let server = MockServer::start().await;
        mount(&server, "eth_getTransactionReceipt", ok(Value::Null)).await;
        mount(&server, "eth_getTransactionByHash", ok(Value::Null)).await;

        let client = client_for(&server).await;
        assert!(client.transaction_receipt(B256::ZERO).await.unwrap().is_none());
        assert!(client.transaction_by_hash(B256::ZERO).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_receipt_decoding() {
        let server = MockServer::start().await;
        let hash = format!("0x{}", "11".repeat(32));
        mount(
            &server,
            "eth_getTransactionReceipt",
            ok(json!({
                "transactionHash": hash,
                "blockNumber": "0x10",
                "status": "0x1",
                "from": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
                "to": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                "gasUsed": "0x5208"
            })),
        )
        .await;

        let client = client_for(&server).await;
        let receipt = client.transaction_receipt(B256::ZERO).await.unwrap().unwrap();
        assert_eq!(receipt.block(), Some(16));
        assert!(receipt.succeeded());
        assert_eq!(receipt.gas_used, Some(U256::from(21_000u64)));
    }
}

// ============================================================================
// Retry behavior
// ============================================================================

mod retry_tests {
    use super::*;

    #[tokio::test]
    async fn test_transient_failures_exhaust_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.block_number().await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount(&server, "eth_blockNumber", ok(json!("0x2a"))).await;

        let client = client_for(&server).await;
        assert_eq!(client.block_number().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_json_body_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body>502 Bad Gateway</body></html>", "text/html"),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.block_number().await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_revert_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_err(-32000, "execution reverted"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let to = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        let err = client.estimate_gas(&CallRequest::new(to)).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rpc { code: -32000, .. }));
    }

    #[tokio::test]
    async fn test_broadcast_is_attempted_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .send_raw_transaction(&Bytes::from_static(&[0x02, 0xf8]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_broadcast_returns_hash() {
        let server = MockServer::start().await;
        let hash = format!("0x{}", "ab".repeat(32));
        mount(&server, "eth_sendRawTransaction", ok(json!(hash))).await;

        let client = client_for(&server).await;
        let got = client
            .send_raw_transaction(&Bytes::from_static(&[0xf8, 0x6b]))
            .await
            .unwrap();
        assert_eq!(format!("{got:#x}"), hash);
    }
}

// ============================================================================
// Failover and connectivity checks
// ============================================================================

mod failover_tests {
    use super::*;

    #[tokio::test]
    async fn test_fails_over_to_secondary_endpoint() {
        let primary = MockServer::start().await;
        let secondary = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&primary)
            .await;
        mount(&secondary, "eth_blockNumber", ok(json!("0x99"))).await;

        let client = EvmClient::new("ethereum_sepolia", fast_config(&[primary.uri(), secondary.uri()]))
            .unwrap();
        assert_eq!(client.block_number().await.unwrap(), 0x99);
        assert_eq!(client.current_url().await, secondary.uri());
    }

    #[tokio::test]
    async fn test_connection_check_reports_connection() {
        let server = MockServer::start().await;
        mount(&server, "eth_blockNumber", ok(json!("0x64"))).await;

        let client = client_for(&server).await;
        let status = client.check_connection().await;
        assert!(status.is_connected());
        assert_eq!(status.latest_block, Some(100));
        assert!(status.error().is_none());
    }

    #[tokio::test]
    async fn test_connection_check_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let status = client.check_connection().await;
        assert!(!status.is_connected());
        assert!(status.latest_block.is_none());
        assert!(status.error().is_some());
    }
}
