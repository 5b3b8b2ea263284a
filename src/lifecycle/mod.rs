//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Operation needs the client:
//!     manager.rs lease() → lazy single-flight create → Lease guard
//!     Lease drop → release, idle clock restarts
//!
//! Background:
//!     reclaim task (per client): active == 0 and idle past threshold → disconnect
//!
//! Teardown:
//!     signals.rs (SIGINT/SIGTERM/SIGUSR1) → shutdown.rs broadcast → disconnect
//! ```
//!
//! # Design Decisions
//! - The client slot and its reclaim stop channel live behind one async
//!   mutex; creation while holding it makes racing callers share one client
//! - Release is only reachable through the Lease guard's Drop
//! - Disconnect is idempotent and safe against a concurrent reclaim cycle

pub mod connector;
pub mod manager;
pub mod shutdown;
pub mod signals;

pub use connector::{Connector, PgConnector};
pub use manager::{ConnectionManager, Lease};
pub use shutdown::Shutdown;
pub use signals::listen_for_signals;
