//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (.env optional)
//!     → loader.rs (DATABASE_URL, APP_ENV, connection_limit parameter)
//!     → validation.rs (semantic checks)
//!     → DbConfig (validated, immutable)
//!     → held by the Steward, shared with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - All fields have defaults so the composition root can construct a
//!   DbConfig directly (tests do)
//! - The connection string is the single source of the concurrency limit

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{connection_limit_from_url, load_from_env, ConfigError};
pub use schema::{
    DbConfig, Environment, MetricsConfig, ReclaimConfig, RetryConfig, DEFAULT_CONNECTION_LIMIT,
};
pub use validation::{validate_config, ValidationError};
