//! The composition-root facade.
//!
//! One [`Steward`] per process, built explicitly and passed around as an
//! `Arc` handle. It owns the lifecycle manager, the metrics registry, the
//! retry policy and the shutdown coordinator; route handlers and services
//! touch the database only through [`Steward::with_connection`].

use std::future::Future;
use std::sync::Arc;

use crate::config::{load_from_env, ConfigError, DbConfig, Environment};
use crate::error::DbError;
use crate::lifecycle::{listen_for_signals, ConnectionManager, Connector, PgConnector, Shutdown};
use crate::observability::metrics::{MetricsRegistry, MetricsSnapshot};
use crate::resilience::classify::Failure;
use crate::resilience::retry;

/// Owns the managed-client machinery for one process.
pub struct Steward<C: Connector> {
    manager: ConnectionManager<C>,
    metrics: Arc<MetricsRegistry>,
    config: DbConfig,
    shutdown: Shutdown,
}

/// The production steward: PostgreSQL through a `sqlx` pool.
pub type PgSteward = Steward<PgConnector>;

impl Steward<PgConnector> {
    /// Build a PostgreSQL steward from the process environment.
    pub fn from_env() -> Result<Arc<Self>, ConfigError> {
        let config = load_from_env()?;
        let connector = PgConnector::new(&config);
        Ok(Self::new(config, connector))
    }
}

impl<C: Connector> Steward<C> {
    /// Build a steward from a validated configuration and a connector.
    pub fn new(config: DbConfig, connector: C) -> Arc<Self> {
        let metrics = Arc::new(MetricsRegistry::new());
        let shutdown = Shutdown::new();
        let manager = ConnectionManager::new(
            connector,
            &config,
            Arc::clone(&metrics),
            shutdown.clone(),
        );
        Arc::new(Self {
            manager,
            metrics,
            config,
            shutdown,
        })
    }

    /// Spawn the metrics reset schedule and the signal listener.
    ///
    /// The idle-reclaim task is owned by the manager and starts with the
    /// first created client. Call once from the composition root.
    pub fn start_background_tasks(self: &Arc<Self>) {
        tokio::spawn(Arc::clone(&self.metrics).run_reset_schedule(
            self.config.metrics.reset_interval(),
            self.shutdown.subscribe(),
        ));
        tokio::spawn(listen_for_signals(Arc::clone(self)));
    }

    /// Run `operation` against the managed client with the configured retry
    /// policy. The sole database entry point for callers.
    pub async fn with_connection<T, F, Fut, E>(
        &self,
        context: &str,
        operation: F,
    ) -> Result<T, DbError>
    where
        F: FnMut(C::Client) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Failure,
    {
        self.with_connection_retries(context, self.config.retry.max_retries, operation)
            .await
    }

    /// Like [`Steward::with_connection`] with an explicit retry budget.
    pub async fn with_connection_retries<T, F, Fut, E>(
        &self,
        context: &str,
        max_retries: u32,
        operation: F,
    ) -> Result<T, DbError>
    where
        F: FnMut(C::Client) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Failure,
    {
        retry::execute(
            &self.manager,
            &self.metrics,
            &self.config.retry,
            max_retries,
            context,
            self.verbose_queries(),
            operation,
        )
        .await
    }

    /// Owned copy of the current counters, for the health endpoint.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The underlying lifecycle manager.
    pub fn manager(&self) -> &ConnectionManager<C> {
        &self.manager
    }

    /// The active configuration.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Handle for wiring additional tasks into this steward's shutdown.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Disconnect the client without stopping background tasks. The next
    /// operation recreates it.
    pub async fn disconnect(&self) {
        self.manager.disconnect().await;
    }

    /// Stop background tasks and disconnect the client. Idempotent; invoked
    /// by the signal listener and by the composition root before a normal
    /// exit.
    pub async fn shutdown(&self) {
        self.shutdown.trigger();
        self.manager.disconnect().await;
    }

    fn verbose_queries(&self) -> bool {
        self.config.environment == Environment::Development
    }
}
