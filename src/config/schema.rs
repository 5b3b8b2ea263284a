//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the database
//! steward. All types derive Serde traits so the composition root can embed
//! them in a larger application config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Concurrency limit used when the connection string does not carry one.
pub const DEFAULT_CONNECTION_LIMIT: u32 = 10;

/// Root configuration for the database steward.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DbConfig {
    /// PostgreSQL connection string. Its `connection_limit` query parameter,
    /// when present, sets `max_connections`.
    pub database_url: String,

    /// Upper bound on concurrently admitted operations.
    pub max_connections: u32,

    /// Deployment environment; selects logging verbosity and whether the
    /// idle-reclaim task runs.
    pub environment: Environment,

    /// How long a single pool acquire may wait before failing, in seconds.
    pub acquire_timeout_secs: u64,

    /// Retry and backoff settings.
    pub retry: RetryConfig,

    /// Idle-client reclamation settings.
    pub reclaim: ReclaimConfig,

    /// Metrics registry settings.
    pub metrics: MetricsConfig,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: DEFAULT_CONNECTION_LIMIT,
            environment: Environment::default(),
            acquire_timeout_secs: 5,
            retry: RetryConfig::default(),
            reclaim: ReclaimConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl DbConfig {
    /// Pool acquire timeout as a [`Duration`].
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Verbose per-query logging; the client is kept across idle periods.
    #[default]
    Development,
    /// Quieter logging; idle clients are reclaimed, suited to short-lived
    /// worker processes.
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Retry and backoff settings for managed operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt; an operation runs at most
    /// `max_retries + 1` times.
    pub max_retries: u32,

    /// Backoff base for attempt 0, in milliseconds.
    pub base_delay_ms: u64,

    /// Backoff ceiling, in milliseconds.
    pub max_delay_ms: u64,

    /// Single advisory wait when the admission check fails, in milliseconds.
    pub admission_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 3000,
            admission_wait_ms: 100,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn admission_wait(&self) -> Duration {
        Duration::from_millis(self.admission_wait_ms)
    }
}

/// Idle-client reclamation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReclaimConfig {
    /// Whether the reclaim task runs at all. The loader enables it only in
    /// production.
    pub enabled: bool,

    /// How often the reclaim cycle checks for idleness, in milliseconds.
    pub interval_ms: u64,

    /// Idle period after which an unused client is disconnected, in
    /// milliseconds.
    pub idle_after_ms: u64,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 30_000,
            idle_after_ms: 10_000,
        }
    }
}

impl ReclaimConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn idle_after(&self) -> Duration {
        Duration::from_millis(self.idle_after_ms)
    }
}

/// Metrics registry settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Interval between scheduled counter resets, in seconds.
    pub reset_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            reset_interval_secs: 3600,
        }
    }
}

impl MetricsConfig {
    pub fn reset_interval(&self) -> Duration {
        Duration::from_secs(self.reset_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = DbConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 100);
        assert_eq!(config.retry.max_delay_ms, 3000);
        assert_eq!(config.retry.admission_wait_ms, 100);
        assert!(config.reclaim.enabled);
        assert_eq!(config.reclaim.interval_ms, 30_000);
        assert_eq!(config.reclaim.idle_after_ms, 10_000);
        assert_eq!(config.metrics.reset_interval_secs, 3600);
    }

    #[test]
    fn environment_deserializes_lowercase() {
        let env: Environment = serde_json::from_str("\"production\"").unwrap();
        assert!(env.is_production());
        let env: Environment = serde_json::from_str("\"development\"").unwrap();
        assert!(!env.is_production());
    }
}
