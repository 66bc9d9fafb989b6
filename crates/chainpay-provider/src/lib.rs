//! # Chainpay Provider
//!
//! JSON-RPC connectivity for EVM networks. Each network gets one
//! [`EvmClient`] holding an ordered endpoint list with failover, a rate
//! limited HTTP client, and a retry policy for idempotent reads. Clients
//! are created lazily and shared through a [`ProviderPool`].
//!
//! ## Example
//!
//! ```ignore
//! use chainpay_provider::{ProviderConfig, ProviderPool};
//!
//! let pool = ProviderPool::new();
//! let client = pool.get_or_connect(
//!     "base_sepolia",
//!     &["https://base-sepolia-rpc.publicnode.com".to_string()],
//! )?;
//! let latest = client.block_number().await?;
//! ```

#![forbid(unsafe_code)]

pub mod client;
pub mod endpoint;
pub mod erc20;
pub mod evm;
pub mod pool;

use chainpay_resilience::{HttpRetryClassifier, RetryClassifier, RetryError, RpcRetryClassifier};
use std::time::Duration;
use thiserror::Error;

pub use client::{HttpClientConfig, JsonRpcError, JsonRpcRequest, RateLimitConfig, RpcClient};
pub use endpoint::{EndpointInfo, ManagedProvider, ProviderConfig};
pub use evm::{CallRequest, ConnectionStatus, EvmClient, RpcReceipt, RpcTransaction};
pub use pool::{PoolSettings, ProviderPool};

/// Provider-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (DNS, refused connection, reset)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from node during {method}")]
    Status {
        /// HTTP status code
        status: u16,
        /// JSON-RPC method being called
        method: String,
    },

    /// JSON-RPC error object returned by the node
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Every attempt failed with a transient error
    #[error("Node unavailable after {attempts} attempts: {reason}")]
    Unavailable {
        /// Attempts made
        attempts: u32,
        /// Last error observed
        reason: String,
    },
}

impl ProviderError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                method: String::new(),
            }
        } else {
            Self::Connection(err.to_string())
        }
    }

    /// Collapses a retry outcome: exhausted transient failures become
    /// [`ProviderError::Unavailable`], permanent failures pass through.
    pub fn from_retry(failure: RetryError<ProviderError>) -> Self {
        if failure.exhausted {
            Self::Unavailable {
                attempts: failure.attempts,
                reason: failure.error.to_string(),
            }
        } else {
            failure.error
        }
    }

    /// True when the node could not be reached or gave no usable answer
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Status { .. } | Self::Unavailable { .. }
        )
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Decides which provider errors deserve another attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderRetryClassifier;

impl RetryClassifier<ProviderError> for ProviderRetryClassifier {
    fn is_retryable(&self, error: &ProviderError) -> bool {
        match error {
            ProviderError::Connection(_) | ProviderError::Timeout(_) | ProviderError::Decode(_) => true,
            ProviderError::Status { status, .. } => HttpRetryClassifier::is_status_retryable(*status),
            ProviderError::Rpc { code, message } => RpcRetryClassifier::is_retryable(*code, message),
            ProviderError::InvalidUrl(_) | ProviderError::Unavailable { .. } => false,
        }
    }

    fn suggested_delay(&self, error: &ProviderError) -> Option<Duration> {
        match error {
            ProviderError::Status { status, .. } if HttpRetryClassifier::is_rate_limited(*status) => {
                Some(Duration::from_secs(1))
            }
            _ => None,
        }
    }
}
