//! Endpoint configuration, health tracking and failover

use chainpay_resilience::{HealthStatus, RetryPolicy, TimeoutConfig};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

use crate::client::RateLimitConfig;
use crate::{ProviderError, Result};

/// Configuration for one network's client
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Primary RPC URL
    pub url: String,
    /// Fallback URLs, tried in order
    pub fallback_urls: Vec<String>,
    /// Per-call timeouts
    pub timeouts: TimeoutConfig,
    /// Retry policy for idempotent calls
    pub retry: RetryPolicy,
    /// Request rate limit, `None` for unlimited
    pub rate_limit: Option<RateLimitConfig>,
    /// Check latency above which an endpoint counts as degraded
    pub degraded_threshold: Duration,
}

impl ProviderConfig {
    /// Creates a new provider configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fallback_urls: Vec::new(),
            timeouts: TimeoutConfig::blockchain(),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimitConfig::default()),
            degraded_threshold: Duration::from_secs(2),
        }
    }

    /// Builds a config from an ordered URL list; the first is primary
    pub fn from_urls(urls: &[String]) -> Result<Self> {
        let (first, rest) = urls
            .split_first()
            .ok_or_else(|| ProviderError::InvalidUrl("no RPC URL configured".to_string()))?;
        let mut config = Self::new(first.clone());
        config.fallback_urls = rest.to_vec();
        Ok(config)
    }

    /// Adds a fallback URL
    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback_urls.push(url.into());
        self
    }

    /// Sets the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts = self.timeouts.with_request(timeout);
        self
    }

    /// Sets the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets or disables the rate limit
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitConfig>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        for url in self.all_urls() {
            let parsed = Url::parse(url).map_err(|e| ProviderError::InvalidUrl(format!("{url}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ProviderError::InvalidUrl(format!(
                    "{url}: unsupported scheme {}",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }

    /// Returns all URLs (primary + fallbacks)
    pub fn all_urls(&self) -> Vec<&str> {
        let mut urls = vec![self.url.as_str()];
        urls.extend(self.fallback_urls.iter().map(|s| s.as_str()));
        urls
    }
}

/// Information about a provider endpoint
#[derive(Debug, Clone)]
pub struct EndpointInfo {
    /// The endpoint URL
    pub url: String,
    /// Current health status
    pub health: HealthStatus,
    /// Last successful request time
    pub last_success: Option<Instant>,
    /// Last failed request time
    pub last_failure: Option<Instant>,
    /// Total requests made
    pub total_requests: u64,
    /// Total failures
    pub total_failures: u64,
    /// Average response time in milliseconds
    pub avg_response_ms: u64,
}

impl EndpointInfo {
    fn new(url: String) -> Self {
        Self {
            url,
            health: HealthStatus::Unknown,
            last_success: None,
            last_failure: None,
            total_requests: 0,
            total_failures: 0,
            avg_response_ms: 0,
        }
    }

    fn record_success(&mut self, response_time_ms: u64) {
        self.last_success = Some(Instant::now());
        self.total_requests += 1;
        self.avg_response_ms = (self.avg_response_ms * (self.total_requests - 1) + response_time_ms)
            / self.total_requests;
        self.health = if self.avg_response_ms < 1000 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
    }

    fn record_failure(&mut self) {
        self.last_failure = Some(Instant::now());
        self.total_requests += 1;
        self.total_failures += 1;

        let failure_rate = self.total_failures as f64 / self.total_requests as f64;
        if failure_rate > 0.5 {
            self.health = HealthStatus::Unhealthy;
        } else if failure_rate > 0.2 {
            self.health = HealthStatus::Degraded;
        }
    }

    /// Returns the success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0
        } else {
            1.0 - (self.total_failures as f64 / self.total_requests as f64)
        }
    }
}

/// Ordered endpoint list with health tracking and failover
#[derive(Debug)]
pub struct ManagedProvider {
    endpoints: RwLock<Vec<EndpointInfo>>,
    current: RwLock<usize>,
}

impl ManagedProvider {
    /// Creates a new managed provider
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let endpoints = config
            .all_urls()
            .into_iter()
            .map(|url| EndpointInfo::new(url.to_string()))
            .collect();

        Ok(Self {
            endpoints: RwLock::new(endpoints),
            current: RwLock::new(0),
        })
    }

    /// Returns the current active endpoint URL
    pub async fn current_url(&self) -> String {
        let idx = *self.current.read().await;
        let endpoints = self.endpoints.read().await;
        endpoints
            .get(idx)
            .or_else(|| endpoints.first())
            .map(|e| e.url.clone())
            .unwrap_or_default()
    }

    /// Records a successful request against `url`
    pub async fn record_success(&self, url: &str, response_time_ms: u64) {
        let mut endpoints = self.endpoints.write().await;
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.record_success(response_time_ms);
        }
    }

    /// Records a failed request against `url` and fails over if it is current
    pub async fn record_failure(&self, url: &str) {
        let mut idx = self.current.write().await;
        let mut endpoints = self.endpoints.write().await;

        let Some(failed) = endpoints.iter().position(|e| e.url == url) else {
            return;
        };
        endpoints[failed].record_failure();

        if failed != *idx {
            return;
        }

        let count = endpoints.len();
        for step in 1..count {
            let next = (*idx + step) % count;
            if endpoints[next].health.is_usable() {
                tracing::info!(
                    from = %endpoints[*idx].url,
                    to = %endpoints[next].url,
                    "failing over to next RPC endpoint"
                );
                *idx = next;
                return;
            }
        }
    }

    /// Returns endpoint statistics
    pub async fn stats(&self) -> Vec<EndpointInfo> {
        self.endpoints.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::new("https://base-sepolia-rpc.publicnode.com")
            .with_fallback("https://sepolia.base.org")
            .with_timeout(Duration::from_secs(60))
            .with_retry(RetryPolicy::new().with_max_attempts(5));

        assert_eq!(config.timeouts.request, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.all_urls().len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_url() {
        assert!(ProviderConfig::new("not-a-valid-url").validate().is_err());
        assert!(ProviderConfig::new("ws://localhost:8546").validate().is_err());
    }

    #[test]
    fn test_from_urls() {
        let urls = vec!["https://a.example".to_string(), "https://b.example".to_string()];
        let config = ProviderConfig::from_urls(&urls).unwrap();
        assert_eq!(config.url, "https://a.example");
        assert_eq!(config.fallback_urls, vec!["https://b.example".to_string()]);
        assert!(ProviderConfig::from_urls(&[]).is_err());
    }

    #[test]
    fn test_endpoint_info() {
        let mut info = EndpointInfo::new("https://example.com".into());
        assert_eq!(info.health, HealthStatus::Unknown);
        assert_eq!(info.success_rate(), 1.0);

        info.record_success(100);
        assert_eq!(info.health, HealthStatus::Healthy);
        assert_eq!(info.total_requests, 1);

        info.record_failure();
        assert_eq!(info.total_failures, 1);
        assert_eq!(info.success_rate(), 0.5);
    }

    #[test]
    fn test_endpoint_degrades() {
        let mut info = EndpointInfo::new("https://example.com".into());
        for i in 0..10 {
            info.record_success(100 + i * 10);
        }
        for _ in 0..5 {
            info.record_failure();
        }
        // 5/15 failures
        assert_eq!(info.health, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_failover_on_failure() {
        let config = ProviderConfig::new("https://primary.example.com")
            .with_fallback("https://fallback.example.com");
        let provider = ManagedProvider::new(&config).unwrap();

        let primary = provider.current_url().await;
        assert!(primary.contains("primary"));

        provider.record_failure(&primary).await;
        assert!(provider.current_url().await.contains("fallback"));
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_move_current() {
        let config = ProviderConfig::new("https://primary.example.com")
            .with_fallback("https://fallback.example.com");
        let provider = ManagedProvider::new(&config).unwrap();

        provider.record_failure("https://fallback.example.com").await;
        assert!(provider.current_url().await.contains("primary"));
    }

    #[tokio::test]
    async fn test_single_endpoint_stays_put() {
        let config = ProviderConfig::new("https://only.example.com");
        let provider = ManagedProvider::new(&config).unwrap();
        provider.record_failure("https://only.example.com").await;
        assert_eq!(provider.current_url().await, "https://only.example.com");

        provider.record_success("https://only.example.com", 20).await;
        let stats = provider.stats().await;
        assert_eq!(stats[0].total_requests, 2);
    }
}
