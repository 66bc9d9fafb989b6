//! Retry policies for unreliable RPC calls
//!
//! A [`RetryPolicy`] owns the attempt budget and backoff shape. Which
//! errors deserve another attempt is decided by a [`RetryClassifier`], so
//! the same policy can wrap any transport.

use std::future::Future;
use std::time::Duration;

use crate::backoff::{BackoffConfig, ExponentialBackoff};

/// Trait for classifying errors as retryable or not
pub trait RetryClassifier<E> {
    /// Check if the error is transient
    fn is_retryable(&self, error: &E) -> bool;

    /// Get suggested delay override for this error (if any)
    fn suggested_delay(&self, _error: &E) -> Option<Duration> {
        None
    }
}

/// HTTP-specific retry classification
#[derive(Debug, Clone, Default)]
pub struct HttpRetryClassifier;

impl HttpRetryClassifier {
    /// Check if HTTP status code is retryable
    pub fn is_status_retryable(status: u16) -> bool {
        matches!(
            status,
            408 | // Request Timeout
            425 | // Too Early
            429 | // Too Many Requests
            500 | // Internal Server Error
            502 | // Bad Gateway
            503 | // Service Unavailable
            504   // Gateway Timeout
        )
    }

    /// Check if status indicates rate limiting
    pub fn is_rate_limited(status: u16) -> bool {
        status == 429
    }
}

/// JSON-RPC specific retry classification
#[derive(Debug, Clone, Default)]
pub struct RpcRetryClassifier;

impl RpcRetryClassifier {
    /// Check if a JSON-RPC error code is transient
    pub fn is_code_retryable(code: i64) -> bool {
        matches!(
            code,
            -32099..=-32000 | // Server errors
            -32603          | // Internal error
            -32005            // Limit exceeded
        )
    }

    /// Messages that mark a node-side rejection as final regardless of code.
    ///
    /// Geth and most forks report reverts and balance failures under the
    /// generic -32000 server error code.
    pub fn is_message_permanent(message: &str) -> bool {
        let msg = message.to_lowercase();
        msg.contains("execution reverted")
            || msg.contains("revert")
            || msg.contains("insufficient funds")
            || msg.contains("gas required exceeds allowance")
            || msg.contains("invalid argument")
            || msg.contains("invalid sender")
            || msg.contains("nonce too low")
            || msg.contains("already known")
            || msg.contains("intrinsic gas too low")
    }

    /// Combined check on a JSON-RPC error object
    pub fn is_retryable(code: i64, message: &str) -> bool {
        Self::is_code_retryable(code) && !Self::is_message_permanent(message)
    }
}

/// Retry policy applied uniformly to RPC calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Maximum backoff delay
    pub max_delay: Duration,
    /// Backoff growth factor
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that makes exactly one attempt.
    ///
    /// Used for non-idempotent calls such as transaction broadcast.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (at least one)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set base delay
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set jitter factor
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Backoff configuration derived from this policy
    pub fn backoff_config(&self) -> BackoffConfig {
        BackoffConfig::new()
            .with_initial_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_multiplier(self.multiplier)
            .with_jitter(self.jitter)
            .with_max_attempts(self.max_attempts)
    }

    /// Run `f` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<F, Fut, T, E, C>(
        &self,
        operation: &str,
        classifier: &C,
        mut f: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        C: RetryClassifier<E>,
    {
        let mut backoff = ExponentialBackoff::new(self.backoff_config());
        let mut attempts = 0;

        loop {
            attempts += 1;
            let error = match f().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !classifier.is_retryable(&error) {
                tracing::debug!(operation, attempts, error = %error, "permanent failure, not retrying");
                return Err(RetryError {
                    attempts,
                    exhausted: false,
                    error,
                });
            }

            let Some(delay) = backoff.next() else {
                tracing::warn!(operation, attempts, error = %error, "retry attempts exhausted");
                return Err(RetryError {
                    attempts,
                    exhausted: true,
                    error,
                });
            };

            let delay = classifier
                .suggested_delay(&error)
                .map(|hint| hint.min(self.max_delay).max(delay))
                .unwrap_or(delay);
            tracing::debug!(
                operation,
                attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient failure, will retry"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Failure returned by [`RetryPolicy::run`]
#[derive(Debug)]
pub struct RetryError<E> {
    /// Attempts made
    pub attempts: u32,
    /// True when the last error was transient and the budget ran out
    pub exhausted: bool,
    /// Last error observed
    pub error: E,
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exhausted {
            write!(f, "all {} attempts failed; last error: {}", self.attempts, self.error)
        } else {
            write!(f, "{}", self.error)
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct AlwaysRetry;

    impl<E> RetryClassifier<E> for AlwaysRetry {
        fn is_retryable(&self, _error: &E) -> bool {
            true
        }
    }

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "transient={}", self.transient)
        }
    }

    struct FlagClassifier;

    impl RetryClassifier<TestError> for FlagClassifier {
        fn is_retryable(&self, error: &TestError) -> bool {
            error.transient
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new()
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(0.0)
    }

    #[test]
    fn test_http_status_retryable() {
        assert!(HttpRetryClassifier::is_status_retryable(500));
        assert!(HttpRetryClassifier::is_status_retryable(503));
        assert!(HttpRetryClassifier::is_status_retryable(429));

        assert!(!HttpRetryClassifier::is_status_retryable(200));
        assert!(!HttpRetryClassifier::is_status_retryable(400));
        assert!(!HttpRetryClassifier::is_status_retryable(404));
    }

    #[test]
    fn test_rpc_code_retryable() {
        assert!(RpcRetryClassifier::is_code_retryable(-32000));
        assert!(RpcRetryClassifier::is_code_retryable(-32603));

        assert!(!RpcRetryClassifier::is_code_retryable(-32600)); // Invalid request
        assert!(!RpcRetryClassifier::is_code_retryable(-32602)); // Invalid params
    }

    #[test]
    fn test_rpc_revert_is_permanent() {
        assert!(!RpcRetryClassifier::is_retryable(-32000, "execution reverted"));
        assert!(!RpcRetryClassifier::is_retryable(
            -32000,
            "insufficient funds for gas * price + value"
        ));
        assert!(RpcRetryClassifier::is_retryable(-32000, "header not found"));
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_config().max_attempts, 3);
        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
        assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast_policy()
            .run("test", &FlagClassifier, || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(TestError { transient: true })
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast_policy()
            .run("test", &FlagClassifier, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError { transient: true })
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.exhausted);
        assert_eq!(err.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = fast_policy()
            .run("test", &FlagClassifier, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError { transient: false })
            })
            .await;

        let err = result.unwrap_err();
        assert!(!err.exhausted);
        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = RetryPolicy::no_retry()
            .run("broadcast", &AlwaysRetry, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError { transient: true })
            })
            .await;

        assert!(result.unwrap_err().exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy::new()
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(0.0);

        let _: Result<(), _> = policy
            .run("test", &AlwaysRetry, || async { Err(TestError { transient: true }) })
            .await;

        // 100ms + 200ms between the three attempts
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
