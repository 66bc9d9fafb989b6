//! Process-wide engine configuration
//!
//! Read once at startup from the environment (a `.env` file is loaded by the
//! binary before this runs) and optionally overridden by CLI flags, then
//! installed into a [`OnceCell`] for lock-free reads.

use chainpay_error::{ChainpayError, Result};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::amount::{self, MAX_DECIMALS};
use crate::network::NetworkRegistry;

static CONFIG: OnceCell<EngineConfig> = OnceCell::new();

/// Default network when a request names none
pub const DEFAULT_NETWORK: &str = "ethereum_mainnet";
/// Default per-transaction ceiling in human units
pub const DEFAULT_MAX_TRANSACTION_VALUE: &str = "10";
/// Default per-call RPC timeout in seconds
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
/// Default RPC attempt budget
pub const DEFAULT_RPC_MAX_ATTEMPTS: u32 = 3;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Network used when a request omits one
    pub default_network: String,
    /// Ceiling on a single transfer, exact decimal in the asset's units
    pub max_transaction_value: String,
    /// Verbose logging
    pub debug: bool,
    /// Per-call RPC timeout
    pub rpc_timeout: Duration,
    /// RPC attempts per idempotent call
    pub rpc_max_attempts: u32,
    /// Primary RPC URL overrides keyed by network name
    pub rpc_overrides: BTreeMap<String, String>,
    /// Whether the registry's secondary URLs are used for failover
    pub rpc_fallbacks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_network: DEFAULT_NETWORK.to_string(),
            max_transaction_value: DEFAULT_MAX_TRANSACTION_VALUE.to_string(),
            debug: false,
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            rpc_max_attempts: DEFAULT_RPC_MAX_ATTEMPTS,
            rpc_overrides: BTreeMap::new(),
            rpc_fallbacks: true,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl EngineConfig {
    /// Reads configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(network) = lookup("DEFAULT_NETWORK").filter(|v| !v.trim().is_empty()) {
            config.default_network = network.trim().to_string();
        }
        if let Some(max) = lookup("MAX_TRANSACTION_VALUE").filter(|v| !v.trim().is_empty()) {
            config.max_transaction_value = max.trim().to_string();
        }
        if let Some(debug) = lookup("DEBUG") {
            config.debug = parse_bool(&debug);
        }
        if let Some(secs) = lookup("RPC_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ChainpayError::Config(format!("RPC_TIMEOUT_SECS: invalid value '{secs}'")))?;
            config.rpc_timeout = Duration::from_secs(secs);
        }
        if let Some(fallbacks) = lookup("RPC_FALLBACKS") {
            config.rpc_fallbacks = parse_bool(&fallbacks);
        }
        if let Some(attempts) = lookup("RPC_MAX_ATTEMPTS") {
            config.rpc_max_attempts = attempts.trim().parse().map_err(|_| {
                ChainpayError::Config(format!("RPC_MAX_ATTEMPTS: invalid value '{attempts}'"))
            })?;
        }

        for network in NetworkRegistry::global().list() {
            if let Some(url) = lookup(&network.rpc_env_var()).filter(|v| !v.trim().is_empty()) {
                config.rpc_overrides.insert(network.name.to_string(), url.trim().to_string());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the default network
    pub fn with_default_network(mut self, network: impl Into<String>) -> Self {
        self.default_network = network.into();
        self
    }

    /// Sets the transfer ceiling
    pub fn with_max_transaction_value(mut self, value: impl Into<String>) -> Self {
        self.max_transaction_value = value.into();
        self
    }

    /// Sets the RPC timeout
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Sets the RPC attempt budget
    pub fn with_rpc_max_attempts(mut self, attempts: u32) -> Self {
        self.rpc_max_attempts = attempts;
        self
    }

    /// Points a network at a specific RPC URL
    pub fn with_rpc_override(mut self, network: impl Into<String>, url: impl Into<String>) -> Self {
        self.rpc_overrides.insert(network.into(), url.into());
        self
    }

    /// Enables or disables failover to secondary registry URLs
    pub fn with_rpc_fallbacks(mut self, enabled: bool) -> Self {
        self.rpc_fallbacks = enabled;
        self
    }

    /// Enables debug logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Checks cross-field consistency
    pub fn validate(&self) -> Result<()> {
        let registry = NetworkRegistry::global();
        registry
            .get(&self.default_network)
            .map_err(|_| ChainpayError::Config(format!("DEFAULT_NETWORK: unknown network '{}'", self.default_network)))?;

        self.max_transaction_limit()?;

        if self.rpc_max_attempts == 0 {
            return Err(ChainpayError::Config("RPC_MAX_ATTEMPTS must be at least 1".into()));
        }
        if self.rpc_timeout.is_zero() {
            return Err(ChainpayError::Config("RPC_TIMEOUT_SECS must be at least 1".into()));
        }
        for network in self.rpc_overrides.keys() {
            registry
                .get(network)
                .map_err(|_| ChainpayError::Config(format!("RPC override for unknown network '{network}'")))?;
        }
        Ok(())
    }

    /// The transfer ceiling scaled to 18 decimals
    pub fn max_transaction_limit(&self) -> Result<alloy::primitives::U256> {
        amount::parse_units(&self.max_transaction_value, MAX_DECIMALS).map_err(|e| {
            ChainpayError::Config(format!("MAX_TRANSACTION_VALUE: {e}"))
        })
    }

    /// Installs this configuration process-wide. Fails if one is already set.
    pub fn install(self) -> Result<&'static EngineConfig> {
        self.validate()?;
        CONFIG
            .set(self)
            .map_err(|_| ChainpayError::Config("configuration already installed".into()))?;
        CONFIG
            .get()
            .ok_or_else(|| ChainpayError::Config("configuration not installed".into()))
    }

    /// The installed configuration, or defaults when none was installed
    pub fn global() -> &'static EngineConfig {
        CONFIG.get_or_init(EngineConfig::default)
    }
}
