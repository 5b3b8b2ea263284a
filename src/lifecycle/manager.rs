//! Client lifecycle management.
//!
//! # Responsibilities
//! - Create the shared client lazily, exactly once per absence (single-flight)
//! - Admit operations against the configured concurrency limit
//! - Track in-flight operations with a guard that releases on every exit path
//! - Reclaim the client after an idle period via a background task
//! - Disconnect idempotently on shutdown
//!
//! # Client state machine
//! ```text
//! ABSENT → (create success) → ACTIVE → (idle with active == 0, or shutdown) → ABSENT
//! ```
//! The reclaim cycle checks `active == 0` before disconnecting, so a client
//! mid-use is never torn down.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::time;

use crate::config::{DbConfig, ReclaimConfig};
use crate::error::ErrorCategory;
use crate::lifecycle::connector::Connector;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics::{MetricEvent, MetricsRegistry};

/// Owns the shared client handle and the discipline around it.
///
/// Cheap to clone; clones share all state.
pub struct ConnectionManager<C: Connector> {
    inner: Arc<ManagerInner<C>>,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ManagerInner<C: Connector> {
    connector: C,
    max_connections: u32,
    reclaim: ReclaimConfig,
    /// The client handle plus the stop channel of its reclaim task. Creation
    /// happens while this lock is held, which makes it single-flight.
    slot: Mutex<ClientSlot<C::Client>>,
    /// In-flight operations currently holding the client.
    active: AtomicU32,
    last_accessed: StdMutex<Instant>,
    /// Suppresses overlapping reclaim cycles.
    cycle_in_progress: AtomicBool,
    metrics: Arc<MetricsRegistry>,
    shutdown: Shutdown,
}

struct ClientSlot<T> {
    client: Option<T>,
    /// Dropping the sender stops the reclaim task for this client.
    reclaim_stop: Option<watch::Sender<bool>>,
}

/// Scoped acquisition of the shared client.
///
/// Dropping the lease releases the client: the active count decrements
/// (floored at zero), the release counter increments, and the idle clock
/// restarts. This is the only release path, so every acquire is matched on
/// all exits including errors and panics.
pub struct Lease<C: Connector> {
    inner: Arc<ManagerInner<C>>,
    client: C::Client,
}

impl<C: Connector> Lease<C> {
    /// The client handle for the duration of this lease.
    pub fn client(&self) -> &C::Client {
        &self.client
    }
}

impl<C: Connector> Drop for Lease<C> {
    fn drop(&mut self) {
        let _ = self
            .inner
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            });
        self.inner.metrics.record(MetricEvent::ConnectionReleased);
        if let Ok(mut stamp) = self.inner.last_accessed.lock() {
            *stamp = Instant::now();
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(
        connector: C,
        config: &DbConfig,
        metrics: Arc<MetricsRegistry>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                connector,
                max_connections: config.max_connections,
                reclaim: config.reclaim.clone(),
                slot: Mutex::new(ClientSlot {
                    client: None,
                    reclaim_stop: None,
                }),
                active: AtomicU32::new(0),
                last_accessed: StdMutex::new(Instant::now()),
                cycle_in_progress: AtomicBool::new(false),
                metrics,
                shutdown,
            }),
        }
    }

    /// The shared client, created on first call.
    ///
    /// Creation runs under the slot lock: concurrent callers racing an
    /// absent client await the lock and observe the one instance the winner
    /// created. Creating a client also starts its idle-reclaim task (when
    /// enabled); the task stops when the client is disconnected.
    pub async fn get_client(&self) -> Result<C::Client, C::Error> {
        let mut slot = self.inner.slot.lock().await;
        if let Some(client) = slot.client.as_ref() {
            self.touch();
            return Ok(client.clone());
        }

        match self.inner.connector.connect().await {
            Ok(client) => {
                self.inner.metrics.record(MetricEvent::ConnectionCreated);
                self.touch();
                if self.inner.reclaim.enabled {
                    let (stop_tx, stop_rx) = watch::channel(false);
                    slot.reclaim_stop = Some(stop_tx);
                    tokio::spawn(reclaim_loop(
                        Arc::clone(&self.inner),
                        stop_rx,
                        self.inner.shutdown.subscribe(),
                    ));
                }
                slot.client = Some(client.clone());
                tracing::info!(
                    max_connections = self.inner.max_connections,
                    "Database client created"
                );
                Ok(client)
            }
            Err(e) => {
                self.inner
                    .metrics
                    .record(MetricEvent::ErrorClassified(ErrorCategory::Connection));
                tracing::error!(error = %e, "Failed to create database client");
                Err(e)
            }
        }
    }

    /// Acquire the client for one operation.
    ///
    /// Combines `get_client` with admission bookkeeping; the returned guard
    /// releases on drop.
    pub async fn lease(&self) -> Result<Lease<C>, C::Error> {
        let client = self.get_client().await?;
        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .metrics
            .record(MetricEvent::ConnectionAcquired { active });
        self.touch();
        Ok(Lease {
            inner: Arc::clone(&self.inner),
            client,
        })
    }

    /// Whether another operation fits under the concurrency limit.
    ///
    /// Advisory: callers that fail this check wait briefly rather than being
    /// rejected.
    pub fn can_admit(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst) < self.inner.max_connections
    }

    /// In-flight operations currently holding the client.
    pub fn active_count(&self) -> u32 {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Whether a client currently exists.
    pub async fn is_connected(&self) -> bool {
        self.inner.slot.lock().await.client.is_some()
    }

    /// Close the client if present and stop its reclaim task. Idempotent.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    fn touch(&self) {
        *self
            .inner
            .last_accessed
            .lock()
            .expect("last-accessed mutex poisoned") = Instant::now();
    }
}

impl<C: Connector> ManagerInner<C> {
    async fn disconnect(&self) {
        let mut slot = self.slot.lock().await;
        // Dropping the sender closes the channel; the reclaim task observes
        // that and exits.
        slot.reclaim_stop.take();
        if let Some(client) = slot.client.take() {
            self.connector.close(&client).await;
            tracing::info!("Database client disconnected");
        }
    }

    fn idle_for(&self) -> std::time::Duration {
        self.last_accessed
            .lock()
            .expect("last-accessed mutex poisoned")
            .elapsed()
    }
}

/// Periodic idle check for one client. One task per created client; exits
/// when the client is disconnected or the process shuts down.
async fn reclaim_loop<C: Connector>(
    inner: Arc<ManagerInner<C>>,
    mut stop: watch::Receiver<bool>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(inner.reclaim.interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                reclaim_pass(&inner).await;
            }
            _ = stop.changed() => {
                tracing::debug!("Idle-reclaim task stopping, client was disconnected");
                break;
            }
            _ = shutdown.recv() => {
                tracing::debug!("Idle-reclaim task received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

async fn reclaim_pass<C: Connector>(inner: &Arc<ManagerInner<C>>) {
    // A cycle already in progress suppresses this one.
    if inner
        .cycle_in_progress
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }

    let active = inner.active.load(Ordering::SeqCst);
    let idle_for = inner.idle_for();
    if active == 0 && idle_for >= inner.reclaim.idle_after() {
        tracing::info!(
            idle_ms = idle_for.as_millis() as u64,
            "Reclaiming idle database client"
        );
        inner.disconnect().await;
    }

    inner.cycle_in_progress.store(false, Ordering::SeqCst);
}
