//! The payment engine facade
//!
//! [`PaymentEngine`] ties the registries, the provider pool and the wallet
//! manager together. Every operation validates its inputs against the
//! registries before the first RPC call.

use alloy::primitives::Address;
use chainpay_error::{ChainpayError, Result};
use chainpay_provider::{EvmClient, PoolSettings, ProviderError, ProviderPool};
use chainpay_resilience::{RetryPolicy, TimeoutConfig};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

use crate::address::{parse_address, validate_address, AddressValidation};
use crate::amount::{normalize, parse_positive};
use crate::balance::{read_asset, read_symbol, BalanceEntry, BalanceResult, UNKNOWN_NATIVE_KEY};
use crate::config::EngineConfig;
use crate::keys::SecretKey;
use crate::network::{resolve_network, NetworkDescriptor};
use crate::status::{parse_tx_hash, track};
use crate::token::{Asset, TokenDescriptor, TokenRegistry};
use crate::transaction::{estimate_fees, submit, GasEstimate, KeySource, TransactionRecord, TransferDraft};
use crate::wallet::{WalletHandle, WalletManager};

/// Translates a provider failure on `network` into the engine taxonomy
pub(crate) fn map_provider_error(network: &str, err: ProviderError) -> ChainpayError {
    let unavailable = |attempts: u32, reason: String| ChainpayError::RpcUnavailable {
        network: network.to_string(),
        attempts,
        reason,
    };
    match err {
        ProviderError::Unavailable { attempts, reason } => unavailable(attempts, reason),
        ProviderError::Connection(reason) | ProviderError::Timeout(reason) | ProviderError::Decode(reason) => {
            unavailable(1, reason)
        }
        err @ ProviderError::Status { .. } => unavailable(1, err.to_string()),
        ProviderError::Rpc { message, .. } if message.to_ascii_lowercase().contains("insufficient funds") => {
            ChainpayError::InsufficientFunds {
                needed: None,
                available: None,
            }
        }
        ProviderError::Rpc { code, message } => ChainpayError::Rpc { code, message },
        ProviderError::InvalidUrl(url) => ChainpayError::Config(format!("invalid RPC URL for {network}: {url}")),
    }
}

/// Connectivity report for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    /// Network name
    pub network: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// EIP-155 chain ID
    pub chain_id: u64,
    /// Endpoint currently in use
    pub rpc_url: String,
    /// Native currency symbol
    pub native_token: &'static str,
    /// Explorer base URL
    pub explorer_url: &'static str,
    /// Whether this is a test network
    pub is_testnet: bool,
    /// Whether the node answered the connectivity check
    pub is_connected: bool,
    /// Latest block, when connected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_block: Option<u64>,
    /// Observed failure, when disconnected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Multi-chain wallet and transaction engine
#[derive(Debug)]
pub struct PaymentEngine {
    config: Arc<EngineConfig>,
    pool: ProviderPool,
    wallets: WalletManager,
}

impl PaymentEngine {
    /// Builds an engine whose RPC policy follows `config`
    pub fn new(config: EngineConfig) -> Result<Self> {
        let settings = PoolSettings {
            timeouts: TimeoutConfig::blockchain().with_request(config.rpc_timeout),
            retry: RetryPolicy::default().with_max_attempts(config.rpc_max_attempts),
            ..PoolSettings::default()
        };
        Self::with_pool_settings(config, settings)
    }

    /// Builds an engine with explicit pool settings
    pub fn with_pool_settings(config: EngineConfig, settings: PoolSettings) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            pool: ProviderPool::with_settings(settings),
            wallets: WalletManager::new(),
        })
    }

    /// Builds an engine from the installed process-wide configuration
    pub fn from_global() -> Result<Self> {
        Self::new(EngineConfig::global().clone())
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Wallet registry
    pub fn wallets(&self) -> &WalletManager {
        &self.wallets
    }

    /// Resolves `name`, or the configured default when omitted
    pub fn resolve_network(&self, name: Option<&str>) -> Result<&'static NetworkDescriptor> {
        resolve_network(name, &self.config.default_network)
    }

    /// RPC URLs for `network` in failover order. An override replaces the
    /// registry's first URL.
    pub fn rpc_urls(&self, network: &NetworkDescriptor) -> Vec<String> {
        let (first, rest) = match self.config.rpc_overrides.get(network.name) {
            Some(url) => (Some(url.clone()), network.rpc_urls.get(1..).unwrap_or_default()),
            None => (None, network.rpc_urls),
        };
        let mut urls: Vec<String> = first.into_iter().collect();
        for url in rest {
            if !urls.iter().any(|u| u == url) {
                urls.push((*url).to_string());
            }
        }
        if !self.config.rpc_fallbacks {
            urls.truncate(1);
        }
        urls
    }

    /// Pooled client for `network`
    pub fn client(&self, network: &NetworkDescriptor) -> Result<Arc<EvmClient>> {
        self.pool
            .get_or_connect(network.name, &self.rpc_urls(network))
            .map_err(|e| map_provider_error(network.name, e))
    }

    /// Network metadata plus a live connectivity check
    pub async fn network_info(&self, network: Option<&str>) -> Result<NetworkInfo> {
        let network = self.resolve_network(network)?;
        let client = self.client(network)?;
        let status = client.check_connection().await;
        Ok(NetworkInfo {
            network: network.name,
            display_name: network.display_name,
            chain_id: network.chain_id,
            rpc_url: client.current_url().await,
            native_token: network.native_symbol,
            explorer_url: network.explorer_url,
            is_testnet: network.is_testnet,
            is_connected: status.is_connected(),
            latest_block: status.latest_block,
            error: status.error().map(str::to_string),
        })
    }

    /// All supported networks in registry order
    pub fn list_networks(&self) -> &'static [NetworkDescriptor] {
        crate::network::list_networks()
    }

    /// Registered tokens, optionally limited to one network
    pub fn supported_tokens(&self, network: Option<&str>) -> Result<Vec<&'static TokenDescriptor>> {
        let registry = TokenRegistry::global();
        match network.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(registry.list().iter().collect()),
            Some(name) => {
                let network = self.resolve_network(Some(name))?;
                Ok(registry.for_network(network.name))
            }
        }
    }

    /// Syntax and checksum validation; never fails
    pub fn validate_address(&self, address: &str) -> AddressValidation {
        validate_address(address)
    }

    // ============ Balances ============

    async fn balances_for(
        &self,
        owner: Address,
        network: Option<&str>,
        tokens: &[&str],
        include_native: bool,
    ) -> BalanceResult {
        let network = match self.resolve_network(network) {
            Ok(network) => network,
            Err(err) => {
                let requested = network.unwrap_or(self.config.default_network.as_str());
                let mut result = BalanceResult::new(&owner, requested.trim());
                if include_native {
                    result.push(UNKNOWN_NATIVE_KEY, BalanceEntry::from_error(&err));
                }
                for symbol in tokens {
                    result.push(symbol.trim().to_ascii_uppercase(), BalanceEntry::from_error(&err));
                }
                return result;
            }
        };

        let mut result = BalanceResult::new(&owner, network.name);
        let client = match self.client(network) {
            Ok(client) => client,
            Err(err) => {
                if include_native {
                    result.push(network.native_symbol, BalanceEntry::from_error(&err));
                }
                for symbol in tokens {
                    result.push(symbol.trim().to_ascii_uppercase(), BalanceEntry::from_error(&err));
                }
                return result;
            }
        };

        if include_native {
            let native = Asset::native(network);
            let entry = read_asset(&client, network, owner, &native).await;
            result.push(native.symbol(), entry);
        }
        let lookups = tokens
            .iter()
            .map(|symbol| read_symbol(&client, network, owner, symbol));
        for (key, entry) in join_all(lookups).await {
            result.push(key, entry);
        }
        result
    }

    /// Native balance, or only the token balance when `token` is given
    pub async fn get_balance(
        &self,
        address: &str,
        network: Option<&str>,
        token: Option<&str>,
    ) -> Result<BalanceResult> {
        let owner = parse_address(address)?;
        let result = match token.map(str::trim).filter(|t| !t.is_empty()) {
            None => self.balances_for(owner, network, &[], true).await,
            Some(symbol) => self.balances_for(owner, network, &[symbol], false).await,
        };
        Ok(result)
    }

    /// Native balance followed by each token in query order
    pub async fn get_balances(
        &self,
        address: &str,
        network: Option<&str>,
        tokens: &[String],
    ) -> Result<BalanceResult> {
        let owner = parse_address(address)?;
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        Ok(self.balances_for(owner, network, &tokens, true).await)
    }

    /// Native balances on several networks, queried concurrently
    pub async fn get_balances_multi(&self, address: &str, networks: &[String]) -> Result<Vec<BalanceResult>> {
        let owner = parse_address(address)?;
        let lookups = networks
            .iter()
            .map(|network| self.balances_for(owner, Some(network.as_str()), &[], true));
        Ok(join_all(lookups).await)
    }

    /// Balance of an agent wallet: the named one or the default agent
    pub async fn agent_wallet_balance(
        &self,
        label: Option<&str>,
        network: Option<&str>,
        token: Option<&str>,
    ) -> Result<(WalletHandle, BalanceResult)> {
        let wallet = self.wallets.resolve_agent(label).await?;
        let balance = self
            .get_balance(&wallet.address.to_checksum(None), network, token)
            .await?;
        Ok((wallet, balance))
    }

    // ============ Transactions ============

    fn draft(
        &self,
        to: &str,
        amount: &str,
        network: Option<&str>,
        token: Option<&str>,
        enforce_limit: bool,
    ) -> Result<(&'static NetworkDescriptor, TransferDraft)> {
        let network = self.resolve_network(network)?;
        let asset = Asset::resolve(token, network)?;
        let recipient = parse_address(to)?;
        let raw = parse_positive(amount, asset.decimals())?;

        if enforce_limit {
            let limit = self.config.max_transaction_limit()?;
            let scaled = normalize(raw, asset.decimals()).ok_or_else(|| ChainpayError::InvalidAmount {
                amount: amount.to_string(),
                reason: "amount too large".to_string(),
            })?;
            if scaled > limit {
                return Err(ChainpayError::AmountExceedsLimit {
                    amount: amount.trim().to_string(),
                    limit: self.config.max_transaction_value.clone(),
                });
            }
        }
        Ok((network, TransferDraft::new(recipient, asset, raw)))
    }

    /// Fee quote for sending `amount` to `to`
    pub async fn estimate_gas_fees(
        &self,
        to: &str,
        amount: &str,
        network: Option<&str>,
        token: Option<&str>,
    ) -> Result<GasEstimate> {
        self.estimate_gas_fees_from(None, to, amount, network, token).await
    }

    /// Fee quote with an optional sender
    pub async fn estimate_gas_fees_from(
        &self,
        from: Option<&str>,
        to: &str,
        amount: &str,
        network: Option<&str>,
        token: Option<&str>,
    ) -> Result<GasEstimate> {
        let (network, draft) = self.draft(to, amount, network, token, false)?;
        let from = from.map(parse_address).transpose()?;
        let client = self.client(network)?;
        estimate_fees(&client, network, &draft, from).await
    }

    /// Signs with `private_key` and broadcasts once
    pub async fn send_transaction(
        &self,
        to: &str,
        amount: &str,
        network: Option<&str>,
        private_key: &str,
        token: Option<&str>,
    ) -> Result<TransactionRecord> {
        let (network, draft) = self.draft(to, amount, network, token, true)?;
        let key = SecretKey::parse(private_key)?;
        let client = self.client(network)?;
        submit(&client, network, &draft, &KeySource::Key(&key)).await
    }

    /// Signs with a registered wallet (the current one when `label` is
    /// omitted) and broadcasts once
    pub async fn send_from_wallet(
        &self,
        label: Option<&str>,
        to: &str,
        amount: &str,
        network: Option<&str>,
        token: Option<&str>,
    ) -> Result<TransactionRecord> {
        let (network, draft) = self.draft(to, amount, network, token, true)?;
        let wallet = self.wallets.resolve(label).await?;
        self.submit_from(wallet, network, &draft).await
    }

    /// Signs with an agent wallet and broadcasts once
    pub async fn send_from_agent_wallet(
        &self,
        label: Option<&str>,
        to: &str,
        amount: &str,
        network: Option<&str>,
        token: Option<&str>,
    ) -> Result<TransactionRecord> {
        let (network, draft) = self.draft(to, amount, network, token, true)?;
        let wallet = self.wallets.resolve_agent(label).await?;
        self.submit_from(wallet, network, &draft).await
    }

    async fn submit_from(
        &self,
        wallet: WalletHandle,
        network: &'static NetworkDescriptor,
        draft: &TransferDraft,
    ) -> Result<TransactionRecord> {
        let client = self.client(network)?;
        let source = KeySource::Wallet {
            manager: &self.wallets,
            label: wallet.label,
        };
        submit(&client, network, draft, &source).await
    }

    /// Live status of `hash`
    pub async fn get_transaction_status(&self, hash: &str, network: Option<&str>) -> Result<TransactionRecord> {
        let hash = parse_tx_hash(hash)?;
        let network = self.resolve_network(network)?;
        let client = self.client(network)?;
        track(&client, network, hash).await
    }
}
