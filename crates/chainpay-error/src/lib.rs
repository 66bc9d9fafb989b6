//! # Chainpay Error
//!
//! Unified error taxonomy for the chainpay multi-chain payment engine.
//!
//! Every fallible operation in the engine returns [`ChainpayError`]. Each
//! variant maps to a stable snake_case kind string ([`ChainpayError::kind`])
//! and a numeric [`ErrorCode`], so protocol adapters can report failures
//! without matching on display text.
//!
//! Messages never carry secret material. Variants that relate to keys only
//! hold a reason, never the key itself.
//!
//! ## Example
//!
//! ```
//! use chainpay_error::{ChainpayError, Result};
//!
//! fn require_prefix(addr: &str) -> Result<()> {
//!     if !addr.starts_with("0x") {
//!         return Err(ChainpayError::InvalidAddress {
//!             address: addr.to_string(),
//!             reason: "missing 0x prefix".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_prefix("abc").unwrap_err();
//! assert_eq!(err.kind(), "invalid_address");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// The main error type for chainpay operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainpayError {
    // ============ Registry Errors ============
    /// Network name is not in the registry
    #[error("Unknown network: {network}")]
    UnknownNetwork {
        /// The requested network name
        network: String,
    },

    /// Token symbol is not registered on the network
    #[error("Unknown token {symbol} on network {network}")]
    UnknownToken {
        /// The requested symbol
        symbol: String,
        /// The network it was looked up on
        network: String,
    },

    // ============ Validation Errors ============
    /// Invalid address format or checksum
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The invalid address
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Malformed private key. Never carries the key itself.
    #[error("Invalid private key: {reason}")]
    InvalidPrivateKey {
        /// Reason for rejection
        reason: String,
    },

    /// Non-positive, malformed or over-precision amount
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount {
        /// The amount as supplied
        amount: String,
        /// Reason for rejection
        reason: String,
    },

    /// Amount above the configured transaction ceiling
    #[error("Amount {amount} exceeds the maximum transaction value {limit}")]
    AmountExceedsLimit {
        /// Requested amount (human units)
        amount: String,
        /// Configured ceiling (human units)
        limit: String,
    },

    /// Request argument missing or of the wrong shape
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Argument name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    // ============ Balance Errors ============
    /// Balance cannot cover amount plus fee
    #[error("Insufficient funds{}", format_funds(.needed, .available))]
    InsufficientFunds {
        /// Required amount in smallest units, when known
        needed: Option<String>,
        /// Available amount in smallest units, when known
        available: Option<String>,
    },

    // ============ Network Errors ============
    /// RPC could not be reached after all retry attempts
    #[error("RPC unavailable for {network} after {attempts} attempt(s): {reason}")]
    RpcUnavailable {
        /// Network name
        network: String,
        /// Attempts made
        attempts: u32,
        /// Last observed failure
        reason: String,
    },

    /// Node rejected the request permanently (revert, bad params)
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Node message
        message: String,
    },

    // ============ Lookup Errors ============
    /// Lookup returned nothing
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up
        what: String,
    },

    /// No wallet registered under the label
    #[error("Wallet not found: {label}")]
    WalletNotFound {
        /// Requested label
        label: String,
    },

    // ============ Internal Errors ============
    /// Local signing failed
    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wrapped error from an external source
    #[error("External error: {message}")]
    External {
        /// Error message
        message: String,
    },
}

fn format_funds(needed: &Option<String>, available: &Option<String>) -> String {
    match (needed, available) {
        (Some(n), Some(a)) => format!(": need {n}, have {a}"),
        (Some(n), None) => format!(": need {n}"),
        _ => String::new(),
    }
}

/// Convenient Result type using ChainpayError
pub type Result<T> = std::result::Result<T, ChainpayError>;

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Adds context to an error
    fn context(self, ctx: impl Into<String>) -> Result<T>;

    /// Adds context using a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| ChainpayError::External {
            message: format!("{}: {}", ctx.into(), e),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| ChainpayError::External {
            message: format!("{}: {}", f(), e),
        })
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| ChainpayError::NotFound { what: ctx.into() })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| ChainpayError::NotFound { what: f() })
    }
}

impl From<hex::FromHexError> for ChainpayError {
    fn from(err: hex::FromHexError) -> Self {
        ChainpayError::InvalidArgument {
            name: "hex".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChainpayError {
    fn from(err: serde_json::Error) -> Self {
        ChainpayError::InvalidArgument {
            name: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Unknown network
    UnknownNetwork = 1001,
    /// Unknown token
    UnknownToken = 1002,
    /// Invalid address
    InvalidAddress = 2001,
    /// Invalid private key
    InvalidPrivateKey = 2002,
    /// Invalid amount
    InvalidAmount = 2003,
    /// Amount exceeds limit
    AmountExceedsLimit = 2004,
    /// Invalid argument
    InvalidArgument = 2005,
    /// Insufficient funds
    InsufficientFunds = 3001,
    /// RPC unavailable
    RpcUnavailable = 4001,
    /// RPC rejected the request
    RpcError = 4002,
    /// Not found
    NotFound = 5001,
    /// Wallet not found
    WalletNotFound = 5002,
    /// Signing failed
    SigningError = 6001,
    /// Configuration error
    ConfigError = 7001,
}

impl ChainpayError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ChainpayError::UnknownNetwork { .. } => ErrorCode::UnknownNetwork,
            ChainpayError::UnknownToken { .. } => ErrorCode::UnknownToken,
            ChainpayError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            ChainpayError::InvalidPrivateKey { .. } => ErrorCode::InvalidPrivateKey,
            ChainpayError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            ChainpayError::AmountExceedsLimit { .. } => ErrorCode::AmountExceedsLimit,
            ChainpayError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            ChainpayError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            ChainpayError::RpcUnavailable { .. } => ErrorCode::RpcUnavailable,
            ChainpayError::Rpc { .. } => ErrorCode::RpcError,
            ChainpayError::NotFound { .. } => ErrorCode::NotFound,
            ChainpayError::WalletNotFound { .. } => ErrorCode::WalletNotFound,
            ChainpayError::Signing(_) => ErrorCode::SigningError,
            ChainpayError::Config(_) => ErrorCode::ConfigError,
            ChainpayError::External { .. } => ErrorCode::Unknown,
        }
    }

    /// Stable snake_case identifier reported to protocol clients
    pub fn kind(&self) -> &'static str {
        match self {
            ChainpayError::UnknownNetwork { .. } => "unknown_network",
            ChainpayError::UnknownToken { .. } => "unknown_token",
            ChainpayError::InvalidAddress { .. } => "invalid_address",
            ChainpayError::InvalidPrivateKey { .. } => "invalid_private_key",
            ChainpayError::InvalidAmount { .. } => "invalid_amount",
            ChainpayError::AmountExceedsLimit { .. } => "amount_exceeds_limit",
            ChainpayError::InvalidArgument { .. } => "invalid_argument",
            ChainpayError::InsufficientFunds { .. } => "insufficient_funds",
            ChainpayError::RpcUnavailable { .. } => "rpc_unavailable",
            ChainpayError::Rpc { .. } => "rpc_error",
            ChainpayError::NotFound { .. } => "not_found",
            ChainpayError::WalletNotFound { .. } => "wallet_not_found",
            ChainpayError::Signing(_) => "signing_error",
            ChainpayError::Config(_) => "config_error",
            ChainpayError::External { .. } => "external",
        }
    }

    /// Returns true for failures detected before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChainpayError::UnknownNetwork { .. }
                | ChainpayError::UnknownToken { .. }
                | ChainpayError::InvalidAddress { .. }
                | ChainpayError::InvalidPrivateKey { .. }
                | ChainpayError::InvalidAmount { .. }
                | ChainpayError::AmountExceedsLimit { .. }
                | ChainpayError::InvalidArgument { .. }
        )
    }

    /// Returns true if a later attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainpayError::RpcUnavailable { .. })
    }
}
