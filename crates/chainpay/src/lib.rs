//! # Chainpay
//!
//! Multi-chain EVM wallet and transaction engine.
//!
//! The engine manages session-scoped signing keys, resolves native and
//! ERC-20 balances, estimates, signs and broadcasts transfers, and tracks
//! finality across every network in the built-in registry.
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`network`] | Network registry |
//! | [`token`] | Token registry and the native/token [`Asset`] split |
//! | [`amount`] | Exact decimal parsing and formatting |
//! | [`keys`] | Zeroizing key storage and masking |
//! | [`wallet`] | Labelled wallet registry |
//! | [`address`] | Address and checksum validation |
//! | [`balance`] | Balance aggregation |
//! | [`transaction`] | Drafting, estimation, signing and broadcast |
//! | [`status`] | Transaction status tracking |
//! | [`config`] | Process-wide configuration |
//!
//! ## Example
//!
//! ```ignore
//! use chainpay::prelude::*;
//!
//! let engine = PaymentEngine::new(EngineConfig::from_env()?)?;
//! let balance = engine
//!     .get_balance("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", Some("base_sepolia"), None)
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod amount;
pub mod balance;
pub mod config;
pub mod engine;
pub mod keys;
pub mod network;
pub mod status;
pub mod token;
pub mod transaction;
pub mod wallet;

pub use address::{parse_address, validate_address, AddressValidation};
pub use amount::{format_units, parse_units, Amount, AmountView};
pub use balance::{BalanceEntry, BalanceResult};
pub use config::EngineConfig;
pub use engine::{NetworkInfo, PaymentEngine};
pub use keys::{derive_address, mask_key, SecretKey};
pub use network::{list_networks, resolve_network, NetworkDescriptor, NetworkRegistry};
pub use token::{list_tokens, resolve_token, Asset, TokenDescriptor, TokenRegistry};
pub use transaction::{GasEstimate, TransactionRecord, TxStatus};
pub use wallet::{GeneratedWallet, WalletHandle, WalletKind, WalletManager, WalletSummary};

pub use chainpay_error::{ChainpayError, ErrorCode, Result};

/// Common imports
pub mod prelude {
    pub use crate::{
        Asset, BalanceResult, ChainpayError, EngineConfig, GasEstimate, PaymentEngine, Result,
        TransactionRecord, TxStatus, WalletKind,
    };
}

/// Crate version
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
