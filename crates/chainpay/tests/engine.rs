//! PaymentEngine behavior against mocked JSON-RPC nodes
//!
//! Covers:
//! - Key derivation and masking
//! - Input validation before any network call
//! - Status tracking from receipts and transactions
//! - The unfunded wallet scenario
//! - Signing, single broadcast and wallet-backed sends
//! - Balance ordering and per-network isolation

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Bytes, B256};
use chainpay::{EngineConfig, PaymentEngine, TxStatus, WalletManager};
use chainpay_provider::PoolSettings;
use chainpay_resilience::{RetryPolicy, TimeoutConfig};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Hardhat/Anvil account #0
const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const SENDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const RECIPIENT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_err(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0", "id": 1, "error": {"code": code, "message": message}
    }))
}

fn fast_settings() -> PoolSettings {
    PoolSettings {
        timeouts: TimeoutConfig::fast().with_request(Duration::from_millis(500)),
        retry: RetryPolicy::new()
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(0.0),
        rate_limit: None,
    }
}

fn engine_with(overrides: &[(&str, &str)]) -> PaymentEngine {
    let mut config = EngineConfig::default()
        .with_default_network("base_sepolia")
        .with_rpc_fallbacks(false);
    for (network, url) in overrides {
        config = config.with_rpc_override(*network, *url);
    }
    PaymentEngine::with_pool_settings(config, fast_settings()).unwrap()
}

fn engine_for(server: &MockServer) -> PaymentEngine {
    let uri = server.uri();
    engine_with(&[
        ("base_sepolia", uri.as_str()),
        ("ethereum_sepolia", uri.as_str()),
        ("base_mainnet", uri.as_str()),
    ])
}

async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Fails the test on drop if the node receives any request
async fn forbid_calls(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ok(Value::Null))
        .expect(0)
        .mount(server)
        .await;
}

fn hash(byte: u8) -> String {
    format!("{:#x}", B256::repeat_byte(byte))
}

// ============================================================================
// Keys
// ============================================================================

mod key_tests {
    use super::*;

    #[test]
    fn test_wallet_address_is_deterministic_and_masked() {
        let (first, masked) = WalletManager::get_wallet_address(KEY).unwrap();
        let (second, _) = WalletManager::get_wallet_address(KEY).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_checksum(None), SENDER);

        assert_eq!(masked, "0xac0974be...7bf4f2ff80");
        assert!(!masked.to_lowercase().contains(&SENDER[2..].to_lowercase()));
    }

    #[test]
    fn test_created_wallets_validate() {
        let engine = engine_with(&[]);
        for _ in 0..8 {
            let wallet = WalletManager::create_wallet().unwrap();
            let validation = engine.validate_address(&wallet.address.to_checksum(None));
            assert!(validation.is_valid);
        }
    }
}

// ============================================================================
// Validation happens before the network
// ============================================================================

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_non_positive_amount_rejected_offline() {
        let server = MockServer::start().await;
        forbid_calls(&server).await;
        let engine = engine_for(&server);

        for amount in ["0", "0.0", "-1", "-0.000001"] {
            let err = engine
                .send_transaction(RECIPIENT, amount, None, KEY, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "invalid_amount", "amount {amount}");
        }
        let err = engine
            .estimate_gas_fees(RECIPIENT, "0", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_amount");
    }

    #[tokio::test]
    async fn test_amount_above_ceiling_rejected_offline() {
        let server = MockServer::start().await;
        forbid_calls(&server).await;
        let engine = engine_for(&server);

        let err = engine
            .send_transaction(RECIPIENT, "10.5", None, KEY, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "amount_exceeds_limit");

        let err = engine
            .send_transaction(RECIPIENT, "11", Some("base_mainnet"), KEY, Some("USDC"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "amount_exceeds_limit");
    }

    #[tokio::test]
    async fn test_bad_inputs_rejected_offline() {
        let server = MockServer::start().await;
        forbid_calls(&server).await;
        let engine = engine_for(&server);

        let err = engine
            .send_transaction("0x1234", "1", None, KEY, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_address");

        let err = engine
            .send_transaction(RECIPIENT, "1", None, "0xdeadbeef", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_private_key");
        assert!(!err.to_string().contains("deadbeef"));

        let err = engine
            .send_transaction(RECIPIENT, "0.0000001", Some("base_mainnet"), KEY, Some("USDC"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_amount");

        let err = engine
            .send_from_wallet(Some("nobody"), RECIPIENT, "1", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "wallet_not_found");

        let err = engine.get_transaction_status("0xabc", None).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }
}

// ============================================================================
// Status tracking
// ============================================================================

mod status_tests {
    use super::*;

    fn receipt(tx: &str, block: u64, status: &str) -> Value {
        json!({
            "transactionHash": tx,
            "blockNumber": format!("{block:#x}"),
            "status": status,
            "from": SENDER,
            "to": RECIPIENT,
            "gasUsed": "0x5208"
        })
    }

    fn transaction(tx: &str, block: Option<u64>) -> Value {
        json!({
            "hash": tx,
            "from": SENDER,
            "to": RECIPIENT,
            "value": "0xde0b6b3a7640000",
            "blockNumber": block.map(|b| format!("{b:#x}")),
            "input": "0x"
        })
    }

    #[tokio::test]
    async fn test_never_broadcast_hash_is_not_found() {
        let server = MockServer::start().await;
        mount(&server, "eth_getTransactionReceipt", ok(Value::Null)).await;
        mount(&server, "eth_getTransactionByHash", ok(Value::Null)).await;

        let record = engine_for(&server)
            .get_transaction_status(&hash(0x11), None)
            .await
            .unwrap();
        assert_eq!(record.status, TxStatus::NotFound);
        assert!(record.confirmations.is_none());
    }

    #[tokio::test]
    async fn test_known_but_unmined_is_pending() {
        let server = MockServer::start().await;
        let tx = hash(0x22);
        mount(&server, "eth_getTransactionReceipt", ok(Value::Null)).await;
        mount(&server, "eth_getTransactionByHash", ok(transaction(&tx, None))).await;

        let record = engine_for(&server)
            .get_transaction_status(&tx, None)
            .await
            .unwrap();
        assert_eq!(record.status, TxStatus::Pending);
        assert_eq!(record.confirmations, Some(0));
        assert_eq!(record.amount.as_deref(), Some("1"));
        assert_eq!(record.asset.as_deref(), Some("ETH"));
    }

    #[tokio::test]
    async fn test_mined_receipt_is_confirmed() {
        let server = MockServer::start().await;
        let tx = hash(0x33);
        mount(&server, "eth_getTransactionReceipt", ok(receipt(&tx, 100, "0x1"))).await;
        mount(&server, "eth_getTransactionByHash", ok(transaction(&tx, Some(100)))).await;
        mount(&server, "eth_blockNumber", ok(json!("0x64"))).await;

        let record = engine_for(&server)
            .get_transaction_status(&tx, None)
            .await
            .unwrap();
        assert_eq!(record.status, TxStatus::Confirmed);
        assert_eq!(record.block_number, Some(100));
        assert_eq!(record.confirmations, Some(1));
        assert_eq!(
            record.explorer_url.as_deref(),
            Some(format!("https://sepolia.basescan.org/tx/{tx}").as_str())
        );
    }

    #[tokio::test]
    async fn test_below_threshold_is_pending() {
        let server = MockServer::start().await;
        let tx = hash(0x44);
        mount(&server, "eth_getTransactionReceipt", ok(receipt(&tx, 100, "0x1"))).await;
        mount(&server, "eth_getTransactionByHash", ok(transaction(&tx, Some(100)))).await;
        mount(&server, "eth_blockNumber", ok(json!("0x65"))).await;

        // ethereum_sepolia needs 3 confirmations
        let record = engine_for(&server)
            .get_transaction_status(&tx, Some("ethereum_sepolia"))
            .await
            .unwrap();
        assert_eq!(record.status, TxStatus::Pending);
        assert_eq!(record.confirmations, Some(2));
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_failed() {
        let server = MockServer::start().await;
        let tx = hash(0x55);
        mount(&server, "eth_getTransactionReceipt", ok(receipt(&tx, 100, "0x0"))).await;
        mount(&server, "eth_getTransactionByHash", ok(transaction(&tx, Some(100)))).await;
        mount(&server, "eth_blockNumber", ok(json!("0x64"))).await;

        let record = engine_for(&server)
            .get_transaction_status(&tx, None)
            .await
            .unwrap();
        assert_eq!(record.status, TxStatus::Failed);
    }
}

// ============================================================================
// Unfunded wallet
// ============================================================================

mod unfunded_tests {
    use super::*;

    async fn unfunded_node() -> MockServer {
        let server = MockServer::start().await;
        mount(&server, "eth_getBalance", ok(json!("0x0"))).await;
        mount(&server, "eth_gasPrice", ok(json!("0x3b9aca00"))).await;
        mount(&server, "eth_estimateGas", ok(json!("0x5208"))).await;
        mount(&server, "eth_getTransactionCount", ok(json!("0x0"))).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_sendRawTransaction"})))
            .respond_with(ok(json!(hash(0x01))))
            .expect(0)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_balance_is_zero() {
        let server = unfunded_node().await;
        let result = engine_for(&server).get_balance(SENDER, None, None).await.unwrap();
        let eth = result.get("ETH").unwrap().amount().unwrap();
        assert_eq!(eth.raw_amount, "0");
        assert_eq!(eth.human_amount, "0");
    }

    #[tokio::test]
    async fn test_estimate_works_without_funds() {
        let server = unfunded_node().await;
        let estimate = engine_for(&server)
            .estimate_gas_fees(RECIPIENT, "0.000001", None, None)
            .await
            .unwrap();
        assert_eq!(estimate.gas_limit, 21_000);
        assert_eq!(estimate.gas_price, 1_000_000_000);
        assert_eq!(estimate.estimated_fee(), "0.000021");
        assert_eq!(estimate.gas_price_gwei(), "1");
        assert_eq!(estimate.native_symbol, "ETH");
    }

    #[tokio::test]
    async fn test_send_is_insufficient_funds() {
        let server = unfunded_node().await;
        let err = engine_for(&server)
            .send_transaction(RECIPIENT, "0.000001", None, KEY, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_funds");
    }

    #[tokio::test]
    async fn test_node_reported_insufficient_funds() {
        let server = MockServer::start().await;
        mount(&server, "eth_gasPrice", ok(json!("0x3b9aca00"))).await;
        mount(&server, "eth_getTransactionCount", ok(json!("0x0"))).await;
        mount(
            &server,
            "eth_estimateGas",
            rpc_err(-32000, "insufficient funds for gas * price + value"),
        )
        .await;

        let err = engine_for(&server)
            .send_transaction(RECIPIENT, "1", None, KEY, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_funds");
    }

    #[tokio::test]
    async fn test_estimate_from_unfunded_sender() {
        let server = MockServer::start().await;
        mount(&server, "eth_gasPrice", ok(json!("0x3b9aca00"))).await;
        mount(
            &server,
            "eth_estimateGas",
            rpc_err(-32000, "insufficient funds for transfer"),
        )
        .await;

        let estimate = engine_for(&server)
            .estimate_gas_fees_from(Some(SENDER), RECIPIENT, "0.001", None, None)
            .await
            .unwrap();
        assert_eq!(estimate.gas_limit, 21_000);
        assert!(estimate.default_limit);
        assert_eq!(estimate.gas_price, 1_000_000_000);
    }

    #[tokio::test]
    async fn test_token_estimate_revert_uses_default_limit() {
        let server = MockServer::start().await;
        mount(&server, "eth_gasPrice", ok(json!("0x0"))).await;
        mount(
            &server,
            "eth_estimateGas",
            rpc_err(3, "execution reverted: ERC20: transfer amount exceeds balance"),
        )
        .await;

        let estimate = engine_for(&server)
            .estimate_gas_fees(RECIPIENT, "5", Some("base_mainnet"), Some("USDC"))
            .await
            .unwrap();
        assert_eq!(estimate.gas_limit, 60_000);
        assert!(estimate.default_limit);
        // zero gas price falls back to the network default (20 gwei)
        assert_eq!(estimate.gas_price, 20_000_000_000);
    }
}

// ============================================================================
// Signing and broadcast
// ============================================================================

mod send_tests {
    use super::*;

    async fn funded_node(broadcast: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        mount(&server, "eth_getBalance", ok(json!("0xde0b6b3a7640000"))).await;
        mount(&server, "eth_gasPrice", ok(json!("0x3b9aca00"))).await;
        mount(&server, "eth_estimateGas", ok(json!("0x5208"))).await;
        mount(&server, "eth_getTransactionCount", ok(json!("0x5"))).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_sendRawTransaction"})))
            .respond_with(broadcast)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    async fn broadcast_payload(server: &MockServer) -> TxEnvelope {
        let requests = server.received_requests().await.unwrap();
        let raw = requests
            .iter()
            .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
            .find(|body| body["method"] == "eth_sendRawTransaction")
            .unwrap()["params"][0]
            .as_str()
            .unwrap()
            .parse::<Bytes>()
            .unwrap();
        TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_send_returns_submitted_with_local_hash() {
        let server = funded_node(ok(json!(hash(0x99)))).await;
        let engine = engine_for(&server);

        let record = engine
            .send_transaction(RECIPIENT, "0.1", None, KEY, None)
            .await
            .unwrap();
        assert_eq!(record.status, TxStatus::Submitted);
        assert_eq!(record.from_address.unwrap().to_checksum(None), SENDER);
        assert_eq!(record.amount.as_deref(), Some("0.1"));

        let sent = broadcast_payload(&server).await;
        assert_eq!(*sent.tx_hash(), record.hash);
        let legacy = sent.as_legacy().unwrap().tx();
        assert_eq!(legacy.chain_id, Some(84_532));
        assert_eq!(legacy.nonce, 5);
        assert_eq!(legacy.gas_limit, 21_000);
        assert_eq!(legacy.gas_price, 1_000_000_000);
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_not_retried() {
        let server = funded_node(ResponseTemplate::new(503)).await;
        let err = engine_for(&server)
            .send_transaction(RECIPIENT, "0.1", None, KEY, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "rpc_unavailable");
    }

    #[tokio::test]
    async fn test_send_from_registered_wallet() {
        let server = funded_node(ok(json!(hash(0x98)))).await;
        let engine = engine_for(&server);
        assert_ok!(engine.wallets().set_user_wallet(KEY, Some("treasury")).await);

        let record = engine
            .send_from_wallet(None, RECIPIENT, "0.25", None, None)
            .await
            .unwrap();
        assert_eq!(record.from_address.unwrap().to_checksum(None), SENDER);
        assert_eq!(*broadcast_payload(&server).await.tx_hash(), record.hash);
    }

    #[tokio::test]
    async fn test_send_from_agent_requires_agent() {
        let server = MockServer::start().await;
        forbid_calls(&server).await;
        let engine = engine_for(&server);
        engine.wallets().set_user_wallet(KEY, None).await.unwrap();

        assert_err!(
            engine
                .send_from_agent_wallet(Some("default"), RECIPIENT, "0.1", None, None)
                .await
        );
    }
}

// ============================================================================
// Balances
// ============================================================================

mod balance_tests {
    use super::*;

    #[tokio::test]
    async fn test_tokens_follow_native_in_query_order() {
        let server = MockServer::start().await;
        mount(&server, "eth_getBalance", ok(json!("0xde0b6b3a7640000"))).await;
        mount(&server, "eth_call", ok(json!(format!("0x{:064x}", 2_500_000u64)))).await;

        let engine = engine_for(&server);
        let tokens = vec!["WETH".to_string(), "XYZ".to_string(), "USDC".to_string()];
        let result = engine
            .get_balances(SENDER, Some("base_mainnet"), &tokens)
            .await
            .unwrap();

        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(keys, vec!["ETH", "WETH", "XYZ", "USDC"]);
        assert_eq!(result.get("ETH").unwrap().amount().unwrap().human_amount, "1");
        assert_eq!(result.get("USDC").unwrap().amount().unwrap().human_amount, "2.5");
        assert_eq!(result.get("XYZ").unwrap().error_kind(), Some("unknown_token"));

        let json = serde_json::to_value(&result).unwrap();
        let balances: Vec<&String> = json["balances"].as_object().unwrap().keys().collect();
        assert_eq!(balances, vec!["ETH", "WETH", "XYZ", "USDC"]);
    }

    #[tokio::test]
    async fn test_unavailable_node_is_an_entry() {
        let server = MockServer::start().await;
        mount(&server, "eth_getBalance", ResponseTemplate::new(503)).await;

        let result = engine_for(&server).get_balance(SENDER, None, None).await.unwrap();
        assert_eq!(result.get("ETH").unwrap().error_kind(), Some("rpc_unavailable"));
    }

    #[tokio::test]
    async fn test_slow_network_does_not_block_the_other() {
        let fast = MockServer::start().await;
        mount(&fast, "eth_getBalance", ok(json!("0x1"))).await;
        let slow = MockServer::start().await;
        mount(
            &slow,
            "eth_getBalance",
            ok(json!("0x2")).set_delay(Duration::from_secs(10)),
        )
        .await;

        let engine = engine_with(&[
            ("base_sepolia", fast.uri().as_str()),
            ("ethereum_sepolia", slow.uri().as_str()),
        ]);
        let networks = vec!["ethereum_sepolia".to_string(), "base_sepolia".to_string()];

        let started = Instant::now();
        let results = engine.get_balances_multi(SENDER, &networks).await.unwrap();
        // three 500ms attempts on the slow node, far below its 10s delay
        assert!(started.elapsed() < Duration::from_secs(5));

        assert_eq!(results[0].network, "ethereum_sepolia");
        assert_eq!(results[0].get("ETH").unwrap().error_kind(), Some("rpc_unavailable"));
        assert_eq!(results[1].network, "base_sepolia");
        assert_eq!(results[1].get("ETH").unwrap().amount().unwrap().raw_amount, "1");
    }
}

// ============================================================================
// Network info
// ============================================================================

mod network_tests {
    use super::*;

    #[tokio::test]
    async fn test_connected_network_reports_latest_block() {
        let server = MockServer::start().await;
        mount(&server, "eth_blockNumber", ok(json!("0x10"))).await;
        let engine = engine_for(&server);

        let info = engine.network_info(None).await.unwrap();
        assert_eq!(info.network, "base_sepolia");
        assert_eq!(info.chain_id, 84532);
        assert!(info.is_connected);
        assert_eq!(info.latest_block, Some(16));
        assert!(info.error.is_none());
        assert!(info.rpc_url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn test_unreachable_network_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let engine = engine_for(&server);

        let info = engine.network_info(Some("ethereum_sepolia")).await.unwrap();
        assert!(!info.is_connected);
        assert!(info.latest_block.is_none());
        assert!(info.error.is_some());
    }

    #[test]
    fn test_unknown_network_is_an_error() {
        let engine = engine_with(&[]);
        let err = tokio_test::block_on(engine.network_info(Some("solana"))).unwrap_err();
        assert_eq!(err.kind(), "unknown_network");
    }
}
