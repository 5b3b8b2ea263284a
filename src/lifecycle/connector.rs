//! The seam between the lifecycle manager and the concrete database driver.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DbConfig;
use crate::resilience::Failure;

/// Creates and closes the opaque client handle the manager owns.
///
/// The manager never looks inside the client: it creates it lazily, hands
/// out clones, and closes it on idle reclaim or shutdown. Tests plug in
/// programmable connectors through this trait.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Handle type given to operations. Cloning must be cheap (a pool
    /// handle, not a socket).
    type Client: Clone + Send + Sync + 'static;

    /// Error produced when the client cannot be established.
    type Error: Failure;

    /// Establish a fresh client.
    async fn connect(&self) -> Result<Self::Client, Self::Error>;

    /// Close a client. Must not fail; drivers report close problems out of
    /// band.
    async fn close(&self, client: &Self::Client);
}

/// PostgreSQL connector backed by a `sqlx` pool.
#[derive(Debug, Clone)]
pub struct PgConnector {
    database_url: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgConnector {
    pub fn new(config: &DbConfig) -> Self {
        Self {
            database_url: config.database_url.clone(),
            max_connections: config.max_connections,
            acquire_timeout: config.acquire_timeout(),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Client = PgPool;
    type Error = sqlx::Error;

    async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.database_url)
            .await
    }

    async fn close(&self, client: &PgPool) {
        client.close().await;
    }
}
