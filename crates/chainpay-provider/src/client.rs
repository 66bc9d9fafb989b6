//! JSON-RPC over HTTP with connection pooling and rate limiting

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::{ProviderError, Result};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout enforced by the HTTP layer
    pub request_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Enable gzip compression
    pub gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("chainpay/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
        }
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst size (max requests in a burst)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

/// RPC request payload
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a, T: Serialize> {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Method name
    pub method: &'a str,
    /// Parameters
    pub params: T,
    /// Request ID
    pub id: u64,
}

impl<'a, T: Serialize> JsonRpcRequest<'a, T> {
    /// Creates a new JSON-RPC request
    pub fn new(method: &'a str, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// RPC response payload.
///
/// `result` is kept as raw JSON so that a `null` result (unknown receipt,
/// unknown transaction) can be decoded into an `Option`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Result (if successful)
    #[serde(default)]
    pub result: serde_json::Value,
    /// Error (if failed)
    pub error: Option<JsonRpcError>,
}

/// RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Additional data
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Message with revert data appended when the node supplied any
    pub fn full_message(&self) -> String {
        match &self.data {
            Some(serde_json::Value::String(data)) => format!("{}: {}", self.message, data),
            _ => self.message.clone(),
        }
    }
}

/// HTTP client with connection pooling and rate limiting
pub struct RpcClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Creates a new RPC client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default(), None)
    }

    /// Creates a new RPC client with custom configuration
    pub fn with_config(
        http_config: HttpClientConfig,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(http_config.pool_max_idle_per_host)
            .pool_idle_timeout(http_config.pool_idle_timeout)
            .connect_timeout(http_config.connect_timeout)
            .timeout(http_config.request_timeout)
            .user_agent(&http_config.user_agent)
            .gzip(http_config.gzip)
            .build()
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let rate_limiter = rate_limit.map(|config| {
            let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
            let burst = NonZeroU32::new(config.burst_size).unwrap_or(per_second);
            RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst))
        });

        Ok(Self {
            client,
            rate_limiter,
            request_id: AtomicU64::new(1),
        })
    }

    /// Makes a JSON-RPC request against `url`
    pub async fn rpc_call<P, R>(&self, url: &str, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(method, params, id);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                method: method.to_string(),
            });
        }

        let body: JsonRpcResponse = response.json().await.map_err(ProviderError::from_reqwest)?;

        if let Some(error) = body.error {
            return Err(ProviderError::Rpc {
                code: error.code,
                message: error.full_message(),
            });
        }

        serde_json::from_value(body.result)
            .map_err(|e| ProviderError::Decode(format!("{method}: {e}")))
    }

    /// Returns the number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_id.load(Ordering::SeqCst) - 1
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("request_count", &self.request_count())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish()
    }
}
