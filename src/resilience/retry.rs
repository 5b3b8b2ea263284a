//! Retry orchestration around managed database operations.
//!
//! # Responsibilities
//! - Lease the shared client for every attempt, releasing on all exit paths
//! - Classify failures and retry transient ones with capped backoff
//! - Record retry, query-timing and error metrics throughout
//! - Surface the final failure as an enriched [`DbError`], never swallow it

use std::future::Future;
use std::time::Instant;

use tokio::time::sleep;
use uuid::Uuid;

use crate::config::RetryConfig;
use crate::error::DbError;
use crate::lifecycle::{ConnectionManager, Connector};
use crate::observability::metrics::{MetricEvent, MetricsRegistry};
use crate::resilience::backoff::backoff_delay;
use crate::resilience::classify::{classify_failure, Classification, Failure};

type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// Run `operation` against the managed client with admission control,
/// classification-driven retries and exponential backoff.
///
/// Attempts are numbered from 0; the operation runs at most
/// `max_retries + 1` times. Permanent failures are surfaced immediately.
pub(crate) async fn execute<C, T, F, Fut, E>(
    manager: &ConnectionManager<C>,
    metrics: &MetricsRegistry,
    retry: &RetryConfig,
    max_retries: u32,
    context: &str,
    verbose: bool,
    mut operation: F,
) -> Result<T, DbError>
where
    C: Connector,
    F: FnMut(C::Client) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Failure,
{
    let operation_id = Uuid::new_v4();
    let started = Instant::now();

    // Advisory admission: wait out short bursts instead of rejecting.
    if !manager.can_admit() {
        tracing::warn!(
            operation_id = %operation_id,
            context,
            active = manager.active_count(),
            "Connection limit reached, briefly waiting before proceeding"
        );
        sleep(retry.admission_wait()).await;
    }

    let mut attempt: u32 = 0;
    loop {
        let (classification, cause): (Classification, BoxedCause) = match manager.lease().await {
            Ok(lease) => {
                let attempt_started = Instant::now();
                match operation(lease.client().clone()).await {
                    Ok(value) => {
                        let elapsed = attempt_started.elapsed();
                        metrics.record(MetricEvent::QueryCompleted { elapsed });
                        if attempt > 0 {
                            metrics.record(MetricEvent::RetrySucceeded);
                        }
                        if verbose {
                            tracing::debug!(
                                operation_id = %operation_id,
                                context,
                                attempt,
                                elapsed_ms = elapsed.as_millis() as u64,
                                "Database operation completed"
                            );
                        }
                        return Ok(value);
                    }
                    Err(e) => (classify_failure(&e), Box::new(e) as BoxedCause),
                }
                // The lease drops here, so the client is released before any
                // backoff sleep.
            }
            Err(e) => (classify_failure(&e), Box::new(e) as BoxedCause),
        };

        if classification.retryable && attempt < max_retries {
            metrics.record(MetricEvent::RetryAttempted);
            let delay = backoff_delay(attempt, retry.base_delay(), retry.max_delay());
            tracing::warn!(
                operation_id = %operation_id,
                context,
                attempt,
                category = %classification.category,
                delay_ms = delay.as_millis() as u64,
                error = %cause,
                "Transient database failure, backing off before retry"
            );
            sleep(delay).await;
            attempt += 1;
            continue;
        }

        if attempt > 0 {
            metrics.record(MetricEvent::RetryFailed);
        }
        metrics.record(MetricEvent::ErrorClassified(classification.category));

        let attempts = attempt + 1;
        tracing::error!(
            operation_id = %operation_id,
            context,
            attempts,
            category = %classification.category,
            retryable = classification.retryable,
            error = %cause,
            "Database operation failed"
        );
        return Err(DbError {
            category: classification.category,
            retryable: classification.retryable,
            context: context.to_string(),
            attempts,
            elapsed: started.elapsed(),
            source: cause,
        });
    }
}
