//! Session-scoped wallet registry
//!
//! Keys are held only in memory, keyed by label. The registry is the one
//! shared mutable structure in the engine and sits behind an async
//! `RwLock`. Callers get addresses, masked keys and signatures back; the
//! key material itself never leaves this module except through
//! [`GeneratedWallet`], which hands a freshly created key to its owner.

use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use chainpay_error::{ChainpayError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

use crate::keys::SecretKey;
use crate::transaction::{sign_request, SignedTransaction};

/// Label used when a user wallet is registered without one
pub const DEFAULT_LABEL: &str = "default";

/// Who controls a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Created by the service for automated operations
    Agent,
    /// Imported from a user-supplied key
    User,
}

impl WalletKind {
    /// Parses `agent` or `user`
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(Self::Agent),
            "user" => Ok(Self::User),
            other => Err(ChainpayError::InvalidArgument {
                name: "wallet_type".to_string(),
                reason: format!("expected 'agent' or 'user', got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Public view of a registered wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletHandle {
    /// Unique label
    pub label: String,
    /// Checksummed address
    pub address: Address,
    /// Agent or user
    pub kind: WalletKind,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    /// Unique label
    pub label: String,
    /// Checksummed address
    pub address: Address,
    /// Agent or user
    pub kind: WalletKind,
    /// Whether this is the current wallet
    pub is_current: bool,
}

/// A newly generated key handed to its owner
pub struct GeneratedWallet {
    /// Derived address
    pub address: Address,
    key: SecretKey,
}

impl GeneratedWallet {
    /// Full key hex for display to the owner, once
    pub fn private_key(&self) -> Zeroizing<String> {
        self.key.expose_hex()
    }

    /// Masked key
    pub fn masked_key(&self) -> String {
        self.key.masked()
    }
}

impl fmt::Debug for GeneratedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedWallet")
            .field("address", &self.address)
            .field("key", &self.key)
            .finish()
    }
}

struct WalletEntry {
    handle: WalletHandle,
    key: SecretKey,
}

#[derive(Default)]
struct Registry {
    wallets: BTreeMap<String, WalletEntry>,
    current: Option<String>,
    agents_created: u64,
}

impl Registry {
    fn insert(&mut self, label: String, address: Address, key: SecretKey, kind: WalletKind) -> WalletHandle {
        let handle = WalletHandle {
            label: label.clone(),
            address,
            kind,
            created_at: Utc::now(),
        };
        let replaced = self
            .wallets
            .insert(label.clone(), WalletEntry { handle: handle.clone(), key })
            .is_some();
        if self.current.is_none() {
            self.current = Some(label);
        }

        tracing::info!(
            label = %handle.label,
            address = %handle.address,
            kind = %kind,
            replaced,
            "wallet registered"
        );
        handle
    }

    fn next_agent_label(&mut self) -> String {
        loop {
            self.agents_created += 1;
            let candidate = format!("agent_{}", self.agents_created);
            if !self.wallets.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Label-keyed wallet store
#[derive(Default)]
pub struct WalletManager {
    inner: RwLock<Registry>,
}

impl fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletManager").finish_non_exhaustive()
    }
}

fn normalize_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(ChainpayError::InvalidArgument {
            name: "label".to_string(),
            reason: "label must not be empty".to_string(),
        });
    }
    Ok(label.to_string())
}

impl WalletManager {
    /// Creates an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a key from the OS CSPRNG without registering it
    pub fn create_wallet() -> Result<GeneratedWallet> {
        let key = SecretKey::generate();
        let address = key.address()?;
        Ok(GeneratedWallet { address, key })
    }

    /// Derives the address for a key string without registering it
    pub fn get_wallet_address(private_key: &str) -> Result<(Address, String)> {
        let key = SecretKey::parse(private_key)?;
        Ok((key.address()?, key.masked()))
    }

    /// Registers `key` under `label`, replacing any wallet with that label
    pub async fn register(&self, key: SecretKey, label: &str, kind: WalletKind) -> Result<WalletHandle> {
        let label = normalize_label(label)?;
        let address = key.address()?;
        let mut registry = self.inner.write().await;
        Ok(registry.insert(label, address, key, kind))
    }

    /// Registers a key produced by [`WalletManager::create_wallet`]
    pub async fn adopt(&self, generated: &GeneratedWallet, label: &str, kind: WalletKind) -> Result<WalletHandle> {
        self.register(generated.key.duplicate(), label, kind).await
    }

    /// Imports a user key under `label` (default `"default"`)
    pub async fn set_user_wallet(&self, private_key: &str, label: Option<&str>) -> Result<WalletHandle> {
        let key = SecretKey::parse(private_key)?;
        self.register(key, label.unwrap_or(DEFAULT_LABEL), WalletKind::User)
            .await
    }

    /// Generates and registers an agent wallet (default label `agent_<n>`)
    pub async fn create_agent_wallet(&self, label: Option<&str>) -> Result<WalletHandle> {
        let key = SecretKey::generate();
        let address = key.address()?;
        let label = label.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);

        // the generated label must be picked and claimed under one guard
        let mut registry = self.inner.write().await;
        let label = match label {
            Some(label) => label,
            None => registry.next_agent_label(),
        };
        Ok(registry.insert(label, address, key, WalletKind::Agent))
    }

    /// Wallets ordered by label, optionally filtered by kind
    pub async fn list(&self, kind: Option<WalletKind>) -> Vec<WalletSummary> {
        let registry = self.inner.read().await;
        registry
            .wallets
            .values()
            .filter(|e| kind.map_or(true, |k| e.handle.kind == k))
            .map(|e| WalletSummary {
                label: e.handle.label.clone(),
                address: e.handle.address,
                kind: e.handle.kind,
                is_current: registry.current.as_deref() == Some(e.handle.label.as_str()),
            })
            .collect()
    }

    /// Looks up a wallet by label
    pub async fn get(&self, label: &str) -> Result<WalletHandle> {
        let registry = self.inner.read().await;
        registry
            .wallets
            .get(label.trim())
            .map(|e| e.handle.clone())
            .ok_or_else(|| ChainpayError::WalletNotFound {
                label: label.to_string(),
            })
    }

    /// The current wallet, if any
    pub async fn current(&self) -> Option<WalletHandle> {
        let registry = self.inner.read().await;
        let label = registry.current.as_ref()?;
        registry.wallets.get(label).map(|e| e.handle.clone())
    }

    /// Makes `label` the current wallet
    pub async fn switch(&self, label: &str) -> Result<WalletHandle> {
        let mut registry = self.inner.write().await;
        let label = label.trim();
        let handle = registry
            .wallets
            .get(label)
            .map(|e| e.handle.clone())
            .ok_or_else(|| ChainpayError::WalletNotFound {
                label: label.to_string(),
            })?;
        registry.current = Some(handle.label.clone());
        tracing::info!(label = %handle.label, "switched current wallet");
        Ok(handle)
    }

    /// Removes a wallet; removing the current wallet clears "current"
    pub async fn remove(&self, label: &str) -> Result<WalletHandle> {
        let mut registry = self.inner.write().await;
        let label = label.trim();
        let entry = registry
            .wallets
            .remove(label)
            .ok_or_else(|| ChainpayError::WalletNotFound {
                label: label.to_string(),
            })?;
        if registry.current.as_deref() == Some(label) {
            registry.current = None;
        }
        tracing::info!(label, "wallet removed");
        Ok(entry.handle.clone())
    }

    /// Resolves a label, or the current wallet when `label` is `None`
    pub async fn resolve(&self, label: Option<&str>) -> Result<WalletHandle> {
        match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => self.get(label).await,
            None => self.current().await.ok_or_else(|| ChainpayError::WalletNotFound {
                label: "<current>".to_string(),
            }),
        }
    }

    /// Resolves an agent wallet: the named one, else the current wallet if
    /// it is an agent, else the first agent by label
    pub async fn resolve_agent(&self, label: Option<&str>) -> Result<WalletHandle> {
        if let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) {
            let handle = self.get(label).await?;
            if handle.kind != WalletKind::Agent {
                return Err(ChainpayError::InvalidArgument {
                    name: "wallet_label".to_string(),
                    reason: format!("wallet '{label}' is not an agent wallet"),
                });
            }
            return Ok(handle);
        }

        let registry = self.inner.read().await;
        let current = registry
            .current
            .as_ref()
            .and_then(|l| registry.wallets.get(l))
            .filter(|e| e.handle.kind == WalletKind::Agent);
        current
            .or_else(|| registry.wallets.values().find(|e| e.handle.kind == WalletKind::Agent))
            .map(|e| e.handle.clone())
            .ok_or_else(|| ChainpayError::WalletNotFound {
                label: "<agent>".to_string(),
            })
    }

    /// Signs `request` with the wallet registered under `label`
    pub async fn sign(&self, label: &str, request: TransactionRequest) -> Result<SignedTransaction> {
        let key = {
            let registry = self.inner.read().await;
            let entry = registry
                .wallets
                .get(label)
                .ok_or_else(|| ChainpayError::WalletNotFound {
                    label: label.to_string(),
                })?;
            entry.key.duplicate()
        };
        sign_request(&key, request).await
    }

    /// Number of registered wallets
    pub async fn len(&self) -> usize {
        self.inner.read().await.wallets.len()
    }

    /// True when no wallet is registered
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.wallets.is_empty()
    }
}
