//! Health status reporting for RPC endpoints

use std::fmt;
use std::time::{Duration, Instant};

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// Service is healthy
    Healthy,
    /// Service responds but slowly or intermittently
    Degraded,
    /// Service is unreachable or failing
    Unhealthy,
    /// Not yet checked
    Unknown,
}

impl HealthStatus {
    /// Whether requests should still be routed to the service
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of a single health check
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    /// Service name (network or endpoint)
    pub name: String,
    /// Health status
    pub status: HealthStatus,
    /// Response time, when the check got an answer
    pub response_time: Option<Duration>,
    /// Error message, when unhealthy or degraded
    pub error: Option<String>,
    /// When the check was performed
    pub checked_at: Instant,
}

impl HealthCheckResult {
    /// Create a healthy result
    pub fn healthy(name: impl Into<String>, response_time: Duration) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            response_time: Some(response_time),
            error: None,
            checked_at: Instant::now(),
        }
    }

    /// Create an unhealthy result
    pub fn unhealthy(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            response_time: None,
            error: Some(error.into()),
            checked_at: Instant::now(),
        }
    }

    /// Create a degraded result
    pub fn degraded(
        name: impl Into<String>,
        response_time: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            response_time: Some(response_time),
            error: Some(reason.into()),
            checked_at: Instant::now(),
        }
    }

    /// Classify a successful check by its latency
    pub fn from_latency(
        name: impl Into<String>,
        response_time: Duration,
        degraded_threshold: Duration,
    ) -> Self {
        if response_time > degraded_threshold {
            Self::degraded(name, response_time, "slow response")
        } else {
            Self::healthy(name, response_time)
        }
    }

    /// True unless the check failed outright
    pub fn is_connected(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy | HealthStatus::Degraded)
    }

    /// Check if result is stale
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.checked_at.elapsed() > max_age
    }
}
