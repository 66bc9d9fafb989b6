//! # Chainpay Resilience
//!
//! Retry, backoff, timeout and health primitives used by the chainpay RPC
//! client pool.
//!
//! - **Retry Policies**: an attempt budget plus backoff shape, with error
//!   classification deciding what is transient
//! - **Exponential Backoff**: growing, capped, jittered delays
//! - **Timeouts**: per-call deadlines
//! - **Health Checks**: check results for connectivity diagnostics
//!
//! ## Retry Policies
//!
//! ```rust
//! use chainpay_resilience::{RetryPolicy, RpcRetryClassifier, HttpRetryClassifier};
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.max_attempts, 3);
//!
//! assert!(HttpRetryClassifier::is_status_retryable(503));
//! assert!(RpcRetryClassifier::is_code_retryable(-32000));
//! assert!(!RpcRetryClassifier::is_retryable(-32000, "execution reverted"));
//! ```
//!
//! ## Exponential Backoff
//!
//! ```rust
//! use chainpay_resilience::{BackoffConfig, ExponentialBackoff};
//! use std::time::Duration;
//!
//! let config = BackoffConfig::new()
//!     .with_initial_delay(Duration::from_millis(100))
//!     .with_max_attempts(3)
//!     .with_jitter(0.0);
//!
//! let delays: Vec<_> = ExponentialBackoff::new(config).collect();
//! assert_eq!(delays.len(), 2);
//! ```
//!
//! ## Timeouts
//!
//! ```rust
//! use chainpay_resilience::TimeoutConfig;
//! use std::time::Duration;
//!
//! let config = TimeoutConfig::blockchain();
//! assert_eq!(config.request, Duration::from_secs(30));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backoff;
pub mod health;
pub mod retry_policy;
pub mod timeout;

pub use backoff::{BackoffConfig, ExponentialBackoff};

pub use health::{HealthCheckResult, HealthStatus};

pub use retry_policy::{
    HttpRetryClassifier, RetryClassifier, RetryError, RetryPolicy, RpcRetryClassifier,
};

pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
