//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Managed operation:
//!     → retry.rs (admission wait, lease, execute)
//!     → On failure: classify.rs (SQLSTATE/message → category + retryability)
//!     → If transient: backoff.rs (capped exponential delay), loop
//!     → Else: enriched DbError surfaced to the caller
//! ```
//!
//! # Design Decisions
//! - The retry contract is an explicit loop over `Result`, not control flow
//!   hidden in exceptions
//! - Classification is pure; retry.rs owns all side effects (metrics, sleeps)
//! - Permanent failures fail fast on the first attempt with zero delay

pub mod backoff;
pub mod classify;
pub mod retry;

pub use backoff::backoff_delay;
pub use classify::{classify, classify_failure, Classification, Failure};
