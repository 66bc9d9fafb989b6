//! Lazily populated per-network client pool

use chainpay_resilience::{RetryPolicy, TimeoutConfig};
use dashmap::DashMap;
use std::sync::Arc;

use crate::client::RateLimitConfig;
use crate::endpoint::ProviderConfig;
use crate::evm::{ConnectionStatus, EvmClient};
use crate::Result;

/// Shared settings applied to every client the pool creates
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Per-call timeouts
    pub timeouts: TimeoutConfig,
    /// Retry policy for reads
    pub retry: RetryPolicy,
    /// Rate limit per client
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::blockchain(),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimitConfig::default()),
        }
    }
}

/// Pool of [`EvmClient`]s keyed by network name.
///
/// A client is built on first use and reused afterwards. Concurrent first
/// uses of the same network may both build a client, but only one is kept.
#[derive(Debug, Default)]
pub struct ProviderPool {
    clients: DashMap<String, Arc<EvmClient>>,
    settings: PoolSettings,
}

impl ProviderPool {
    /// Creates an empty pool with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty pool with custom settings
    pub fn with_settings(settings: PoolSettings) -> Self {
        Self {
            clients: DashMap::new(),
            settings,
        }
    }

    /// Settings used for new clients
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Returns the client for `network`, connecting with `urls` if absent
    pub fn get_or_connect(&self, network: &str, urls: &[String]) -> Result<Arc<EvmClient>> {
        if let Some(client) = self.clients.get(network) {
            return Ok(client.clone());
        }

        let config = ProviderConfig::from_urls(urls)?
            .with_retry(self.settings.retry.clone())
            .with_rate_limit(self.settings.rate_limit.clone());
        let config = ProviderConfig {
            timeouts: self.settings.timeouts.clone(),
            ..config
        };
        let client = Arc::new(EvmClient::new(network, config)?);
        tracing::debug!(network, urls = ?urls, "created RPC client");

        Ok(self
            .clients
            .entry(network.to_string())
            .or_insert(client)
            .clone())
    }

    /// Returns an existing client
    pub fn get(&self, network: &str) -> Option<Arc<EvmClient>> {
        self.clients.get(network).map(|c| c.clone())
    }

    /// Drops a client so the next use reconnects
    pub fn remove(&self, network: &str) -> Option<Arc<EvmClient>> {
        self.clients.remove(network).map(|(_, c)| c)
    }

    /// Names of networks with a live client
    pub fn networks(&self) -> Vec<String> {
        self.clients.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of live clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True when no client has been created
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Checks connectivity of every live client
    pub async fn check_all(&self) -> Vec<(String, ConnectionStatus)> {
        let clients: Vec<_> = self
            .clients
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut results = Vec::with_capacity(clients.len());
        for (name, client) in clients {
            results.push((name, client.check_connection().await));
        }
        results
    }
}
