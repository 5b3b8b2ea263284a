//! Managed database connection lifecycle for a multi-tenant web application.
//!
//! One process-local client handle, created lazily and shared by every
//! operation; admission against a configured concurrency limit; transient
//! failures retried with capped exponential backoff; idle clients reclaimed
//! in short-lived-process environments; counters for all of it.
//!
//! # Architecture Overview
//!
//! ```text
//!   route handlers / services
//!            │
//!            ▼
//!   ┌─────────────────┐     ┌──────────────────────────────────────────┐
//!   │     Steward     │     │              resilience                  │
//!   │ with_connection ├────▶│ retry loop → classify → backoff → retry  │
//!   └───────┬─────────┘     └──────────────┬───────────────────────────┘
//!           │                              │ lease / release
//!           │                              ▼
//!           │               ┌──────────────────────────┐
//!           │               │        lifecycle         │
//!           │               │ manager: lazy client,    │
//!           │               │ admission, idle reclaim, │
//!           │               │ signals + shutdown       │
//!           │               └──────────────┬───────────┘
//!           │                              │ Connector seam
//!           │                              ▼
//!           │                      sqlx PostgreSQL pool
//!           │
//!           ▼
//!   ┌──────────────────────────────┐
//!   │       observability          │
//!   │ metrics registry + snapshot, │
//!   │ scheduled reset, logging     │
//!   └──────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod resilience;

// Cross-cutting concerns
pub mod observability;

// Composition-root facade
pub mod steward;

pub use config::{DbConfig, Environment};
pub use error::{DbError, ErrorCategory};
pub use lifecycle::{ConnectionManager, Connector, Lease, PgConnector, Shutdown};
pub use observability::logging::init_logging;
pub use observability::metrics::{MetricEvent, MetricsRegistry, MetricsSnapshot};
pub use resilience::{backoff_delay, classify, Classification, Failure};
pub use steward::{PgSteward, Steward};
