//! Typed Ethereum JSON-RPC calls for a single network

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use chainpay_resilience::{with_timeout, HealthCheckResult, RetryPolicy};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;

use crate::client::{HttpClientConfig, RpcClient};
use crate::endpoint::{EndpointInfo, ManagedProvider, ProviderConfig};
use crate::{erc20, ProviderError, ProviderRetryClassifier, Result};

/// Parameters for `eth_call` and `eth_estimateGas`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Recipient or contract
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Native value in wei
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Calldata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl CallRequest {
    /// Call targeting `to`
    pub fn new(to: Address) -> Self {
        Self {
            to: Some(to),
            ..Default::default()
        }
    }

    /// Set the sender
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the native value
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the calldata
    pub fn data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }
}

/// Subset of a transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// Transaction hash
    pub transaction_hash: B256,
    /// Block the transaction was included in
    pub block_number: Option<U64>,
    /// 1 for success, 0 for revert; absent before Byzantium
    #[serde(default)]
    pub status: Option<U64>,
    /// Sender
    pub from: Address,
    /// Recipient, absent for contract creation
    #[serde(default)]
    pub to: Option<Address>,
    /// Gas consumed
    #[serde(default)]
    pub gas_used: Option<U256>,
}

impl RpcReceipt {
    /// Inclusion block as a plain number
    pub fn block(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }

    /// Whether execution succeeded
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1))
    }
}

/// Subset of a transaction object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    /// Transaction hash
    pub hash: B256,
    /// Sender
    pub from: Address,
    /// Recipient, absent for contract creation
    #[serde(default)]
    pub to: Option<Address>,
    /// Native value in wei
    pub value: U256,
    /// Block number, absent while pending
    #[serde(default)]
    pub block_number: Option<U64>,
    /// Calldata
    #[serde(default)]
    pub input: Bytes,
}

/// Result of a connectivity check
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    /// Health classification
    pub health: HealthCheckResult,
    /// Latest block, when the node answered
    pub latest_block: Option<u64>,
}

impl ConnectionStatus {
    /// True when the node answered
    pub fn is_connected(&self) -> bool {
        self.health.is_connected()
    }

    /// Observed error, if any
    pub fn error(&self) -> Option<&str> {
        self.health.error.as_deref()
    }
}

/// JSON-RPC client bound to one network
#[derive(Debug)]
pub struct EvmClient {
    name: String,
    rpc: RpcClient,
    endpoints: ManagedProvider,
    config: ProviderConfig,
}

impl EvmClient {
    /// Creates a client for the network `name`
    pub fn new(name: impl Into<String>, config: ProviderConfig) -> Result<Self> {
        let endpoints = ManagedProvider::new(&config)?;
        let http = HttpClientConfig {
            connect_timeout: config.timeouts.connect,
            request_timeout: config.timeouts.request,
            pool_idle_timeout: config.timeouts.idle,
            ..HttpClientConfig::default()
        };
        let rpc = RpcClient::with_config(http, config.rate_limit.clone())?;

        Ok(Self {
            name: name.into(),
            rpc,
            endpoints,
            config,
        })
    }

    /// Network name this client serves
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint currently receiving requests
    pub async fn current_url(&self) -> String {
        self.endpoints.current_url().await
    }

    /// Per-endpoint statistics
    pub async fn endpoint_stats(&self) -> Vec<EndpointInfo> {
        self.endpoints.stats().await
    }

    async fn attempt<R: DeserializeOwned>(&self, method: &'static str, params: &Value) -> Result<R> {
        let url = self.endpoints.current_url().await;
        let started = Instant::now();
        let outcome = with_timeout(
            self.config.timeouts.request,
            method,
            self.rpc.rpc_call::<_, R>(&url, method, params),
        )
        .await;

        match outcome {
            Ok(Ok(value)) => {
                let elapsed = started.elapsed().as_millis() as u64;
                self.endpoints.record_success(&url, elapsed).await;
                Ok(value)
            }
            Ok(Err(err)) => {
                if err.is_unavailable() {
                    self.endpoints.record_failure(&url).await;
                }
                Err(err)
            }
            Err(timeout) => {
                self.endpoints.record_failure(&url).await;
                Err(ProviderError::Timeout(timeout.to_string()))
            }
        }
    }

    async fn request_with<R: DeserializeOwned>(
        &self,
        policy: &RetryPolicy,
        method: &'static str,
        params: Value,
    ) -> Result<R> {
        let params = &params;
        policy
            .run(method, &ProviderRetryClassifier, move || self.attempt(method, params))
            .await
            .map_err(ProviderError::from_retry)
    }

    async fn request<R: DeserializeOwned>(&self, method: &'static str, params: Value) -> Result<R> {
        self.request_with(&self.config.retry, method, params).await
    }

    /// `eth_chainId`
    pub async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<u64> {
        let block: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(block.to::<u64>())
    }

    /// `eth_getBalance` at the latest block
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"])).await
    }

    /// ERC-20 `balanceOf` through `eth_call`
    pub async fn get_token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let request = CallRequest::new(token).data(erc20::balance_of_calldata(owner));
        let data = self.call(&request).await?;
        erc20::decode_balance(&data)
    }

    /// `eth_call` at the latest block
    pub async fn call(&self, request: &CallRequest) -> Result<Bytes> {
        self.request("eth_call", json!([request, "latest"])).await
    }

    /// `eth_estimateGas`
    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<u64> {
        let gas: U64 = self.request("eth_estimateGas", json!([request])).await?;
        Ok(gas.to::<u64>())
    }

    /// `eth_gasPrice` in wei
    pub async fn gas_price(&self) -> Result<u128> {
        let price: U256 = self.request("eth_gasPrice", json!([])).await?;
        u128::try_from(price).map_err(|e| ProviderError::Decode(format!("eth_gasPrice: {e}")))
    }

    /// `eth_getTransactionCount` including pending transactions
    pub async fn transaction_count(&self, address: Address) -> Result<u64> {
        let nonce: U64 = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        Ok(nonce.to::<u64>())
    }

    /// `eth_sendRawTransaction`, attempted exactly once
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256> {
        self.request_with(&RetryPolicy::no_retry(), "eth_sendRawTransaction", json!([raw]))
            .await
    }

    /// `eth_getTransactionReceipt`; `None` while unknown or pending
    pub async fn transaction_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }

    /// `eth_getTransactionByHash`; `None` when the node has never seen it
    pub async fn transaction_by_hash(&self, hash: B256) -> Result<Option<RpcTransaction>> {
        self.request("eth_getTransactionByHash", json!([hash])).await
    }

    /// Single-attempt `eth_blockNumber` that never fails
    pub async fn check_connection(&self) -> ConnectionStatus {
        let started = Instant::now();
        match self
            .request_with::<U64>(&RetryPolicy::no_retry(), "eth_blockNumber", json!([]))
            .await
        {
            Ok(block) => ConnectionStatus {
                health: HealthCheckResult::from_latency(
                    self.name.as_str(),
                    started.elapsed(),
                    self.config.degraded_threshold,
                ),
                latest_block: Some(block.to::<u64>()),
            },
            Err(err) => {
                tracing::warn!(network = %self.name, error = %err, "connectivity check failed");
                ConnectionStatus {
                    health: HealthCheckResult::unhealthy(self.name.as_str(), err.to_string()),
                    latest_block: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_call_request_serialization() {
        let to = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let req = CallRequest::new(to).value(U256::from(16u64));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["value"], "0x10");
        assert!(json.get("from").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_receipt_status() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "ab".repeat(32)),
            "blockNumber": "0x64",
            "status": "0x0",
            "from": "0x0000000000000000000000000000000000000001",
            "to": null,
        }))
        .unwrap();
        assert_eq!(receipt.block(), Some(100));
        assert!(!receipt.succeeded());
        assert!(receipt.to.is_none());
    }

    #[test]
    fn test_receipt_without_status_counts_as_success() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "cd".repeat(32)),
            "blockNumber": "0x1",
            "from": "0x0000000000000000000000000000000000000002",
        }))
        .unwrap();
        assert!(receipt.succeeded());
    }
}
