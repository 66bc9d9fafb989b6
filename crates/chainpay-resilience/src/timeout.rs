//! Timeouts for RPC calls

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Timeout configuration for node connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection establishment timeout
    pub connect: Duration,
    /// Total time for a single request/response
    pub request: Duration,
    /// How long pooled idle connections are kept
    pub idle: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::blockchain()
    }
}

impl TimeoutConfig {
    /// Create new timeout config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connection timeout
    pub fn with_connect(mut self, timeout: Duration) -> Self {
        self.connect = timeout;
        self
    }

    /// Set request timeout
    pub fn with_request(mut self, timeout: Duration) -> Self {
        self.request = timeout;
        self
    }

    /// Fast timeouts for local nodes and tests
    pub fn fast() -> Self {
        Self {
            connect: Duration::from_secs(2),
            request: Duration::from_secs(5),
            idle: Duration::from_secs(30),
        }
    }

    /// Public RPC endpoints, where some calls are slow
    pub fn blockchain() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
            idle: Duration::from_secs(90),
        }
    }
}

/// Timeout error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutError {
    /// The operation that timed out
    pub operation: String,
    /// The timeout duration
    pub duration: Duration,
}

impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "operation '{}' timed out after {:?}",
            self.operation, self.duration
        )
    }
}

impl std::error::Error for TimeoutError {}

/// Execute a future with a timeout
pub async fn with_timeout<T>(
    duration: Duration,
    operation: impl Into<String>,
    future: impl Future<Output = T>,
) -> Result<T, TimeoutError> {
    let op = operation.into();
    timeout(duration, future).await.map_err(|_| TimeoutError {
        operation: op,
        duration,
    })
}
