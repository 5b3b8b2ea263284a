//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, running mean, snapshots)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Health endpoint (metrics snapshot as JSON)
//! ```
//!
//! # Design Decisions
//! - Operation IDs flow through every log line of a managed operation
//! - Metric updates are cheap (one mutex, plain arithmetic)
//! - The snapshot, not the registry, crosses the API boundary

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{MetricEvent, MetricsRegistry, MetricsSnapshot};
