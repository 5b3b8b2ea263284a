//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count connection lifecycle events, retry outcomes and classified errors
//! - Track query timing as an incremental running mean
//! - Hand out immutable snapshots for the health endpoint
//! - Reset all counters on a fixed schedule
//!
//! # Design Decisions
//! - One registry per process, held behind a single mutex so resets and
//!   records are mutually exclusive
//! - `record` takes a typed event; each event touches exactly one counter
//!   (query completion also folds its sample into the running mean)
//! - Snapshots are owned copies; callers can never corrupt live counters

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time;

use crate::error::ErrorCategory;

/// One countable event in the life of the managed client.
#[derive(Debug, Clone, Copy)]
pub enum MetricEvent {
    /// A client handle was created.
    ConnectionCreated,
    /// An in-flight operation released the client.
    ConnectionReleased,
    /// An operation acquired the client; `active` is the count including it.
    ConnectionAcquired { active: u32 },
    /// A transient failure triggered a retry.
    RetryAttempted,
    /// An operation succeeded after at least one retry.
    RetrySucceeded,
    /// An operation exhausted its retries.
    RetryFailed,
    /// An operation completed; `elapsed` is its execution time.
    QueryCompleted { elapsed: Duration },
    /// A terminal failure was classified into a category.
    ErrorClassified(ErrorCategory),
}

/// Owned copy of every counter, serializable for the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub connections_created: u64,
    pub connections_released: u64,
    /// High-water mark of concurrently active operations.
    pub max_concurrent_connections: u32,
    pub retry_attempts: u64,
    pub successful_retries: u64,
    pub failed_retries: u64,
    pub total_queries: u64,
    /// Running mean of query execution time, in milliseconds.
    pub average_query_time_ms: f64,
    pub connection_errors: u64,
    pub query_errors: u64,
    pub timeout_errors: u64,
    pub other_errors: u64,
    /// When the counters were last zeroed.
    pub last_reset: DateTime<Utc>,
}

impl MetricsSnapshot {
    fn empty(last_reset: DateTime<Utc>) -> Self {
        Self {
            connections_created: 0,
            connections_released: 0,
            max_concurrent_connections: 0,
            retry_attempts: 0,
            successful_retries: 0,
            failed_retries: 0,
            total_queries: 0,
            average_query_time_ms: 0.0,
            connection_errors: 0,
            query_errors: 0,
            timeout_errors: 0,
            other_errors: 0,
            last_reset,
        }
    }

    /// JSON representation for the health/observability endpoint.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Process-wide counter registry.
pub struct MetricsRegistry {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::empty(Utc::now())),
        }
    }

    /// Record one event.
    pub fn record(&self, event: MetricEvent) {
        let mut m = self.inner.lock().expect("metrics mutex poisoned");
        match event {
            MetricEvent::ConnectionCreated => m.connections_created += 1,
            MetricEvent::ConnectionReleased => m.connections_released += 1,
            MetricEvent::ConnectionAcquired { active } => {
                if active > m.max_concurrent_connections {
                    m.max_concurrent_connections = active;
                }
            }
            MetricEvent::RetryAttempted => m.retry_attempts += 1,
            MetricEvent::RetrySucceeded => m.successful_retries += 1,
            MetricEvent::RetryFailed => m.failed_retries += 1,
            MetricEvent::QueryCompleted { elapsed } => {
                m.total_queries += 1;
                let n = m.total_queries as f64;
                let sample_ms = elapsed.as_secs_f64() * 1000.0;
                m.average_query_time_ms =
                    (m.average_query_time_ms * (n - 1.0) + sample_ms) / n;
            }
            MetricEvent::ErrorClassified(category) => match category {
                ErrorCategory::Connection => m.connection_errors += 1,
                ErrorCategory::Timeout => m.timeout_errors += 1,
                ErrorCategory::Serialization => m.query_errors += 1,
                ErrorCategory::Other => m.other_errors += 1,
            },
        }
    }

    /// Owned copy of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().expect("metrics mutex poisoned").clone()
    }

    /// Zero every counter and stamp `last_reset`.
    pub fn reset(&self) {
        let mut m = self.inner.lock().expect("metrics mutex poisoned");
        *m = MetricsSnapshot::empty(Utc::now());
        tracing::debug!("Metrics counters reset");
    }

    /// Reset the counters on a fixed interval until shutdown.
    pub async fn run_reset_schedule(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = time::interval(interval);
        // The first tick completes immediately; skip it so the schedule
        // starts one full interval out.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reset();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Metrics reset task received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let registry = MetricsRegistry::new();
        registry.record(MetricEvent::ConnectionCreated);
        registry.record(MetricEvent::ConnectionReleased);
        registry.record(MetricEvent::RetryAttempted);
        registry.record(MetricEvent::RetryAttempted);
        registry.record(MetricEvent::RetrySucceeded);
        registry.record(MetricEvent::ErrorClassified(ErrorCategory::Timeout));

        let m = registry.snapshot();
        assert_eq!(m.connections_created, 1);
        assert_eq!(m.connections_released, 1);
        assert_eq!(m.retry_attempts, 2);
        assert_eq!(m.successful_retries, 1);
        assert_eq!(m.failed_retries, 0);
        assert_eq!(m.timeout_errors, 1);
        assert_eq!(m.connection_errors, 0);
    }

    #[test]
    fn high_water_mark_is_monotonic() {
        let registry = MetricsRegistry::new();
        registry.record(MetricEvent::ConnectionAcquired { active: 2 });
        registry.record(MetricEvent::ConnectionAcquired { active: 5 });
        registry.record(MetricEvent::ConnectionAcquired { active: 3 });
        assert_eq!(registry.snapshot().max_concurrent_connections, 5);
    }

    #[test]
    fn running_mean_folds_samples_incrementally() {
        let registry = MetricsRegistry::new();
        for ms in [10, 20, 30] {
            registry.record(MetricEvent::QueryCompleted {
                elapsed: Duration::from_millis(ms),
            });
        }
        let m = registry.snapshot();
        assert_eq!(m.total_queries, 3);
        assert!((m.average_query_time_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let registry = MetricsRegistry::new();
        registry.record(MetricEvent::ConnectionCreated);
        let before = registry.snapshot();
        registry.record(MetricEvent::ConnectionCreated);
        assert_eq!(before.connections_created, 1);
        assert_eq!(registry.snapshot().connections_created, 2);
    }

    #[test]
    fn reset_zeroes_and_restamps() {
        let registry = MetricsRegistry::new();
        registry.record(MetricEvent::ConnectionCreated);
        registry.record(MetricEvent::QueryCompleted {
            elapsed: Duration::from_millis(42),
        });
        let stamp_before = registry.snapshot().last_reset;

        registry.reset();

        let m = registry.snapshot();
        assert_eq!(m.connections_created, 0);
        assert_eq!(m.total_queries, 0);
        assert_eq!(m.average_query_time_ms, 0.0);
        assert!(m.last_reset >= stamp_before);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let registry = MetricsRegistry::new();
        registry.record(MetricEvent::ConnectionCreated);
        let json = registry.snapshot().to_json();
        assert_eq!(json["connections_created"], 1);
        assert!(json.get("last_reset").is_some());
    }

    #[tokio::test]
    async fn reset_schedule_zeroes_on_interval_and_stops_on_shutdown() {
        let registry = Arc::new(MetricsRegistry::new());
        let (tx, rx) = broadcast::channel(1);

        registry.record(MetricEvent::ConnectionCreated);
        let task = tokio::spawn(
            Arc::clone(&registry).run_reset_schedule(Duration::from_millis(50), rx),
        );

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(registry.snapshot().connections_created, 0);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("reset task should exit on shutdown")
            .unwrap();
    }
}
