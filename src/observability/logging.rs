//! Logging bootstrap.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the environment-derived default filter. Development
/// gets per-query debug logging; production stays at info. Calling this more
/// than once is a no-op.
pub fn init_logging(environment: Environment) {
    let default_filter = match environment {
        Environment::Development => "db_steward=debug",
        Environment::Production => "db_steward=info",
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
