//! Configuration loading from the process environment.

use std::env;

use url::Url;

use crate::config::schema::{DbConfig, Environment, DEFAULT_CONNECTION_LIMIT};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// `DATABASE_URL` is not set.
    MissingDatabaseUrl,
    /// The assembled configuration failed semantic validation.
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingDatabaseUrl => write!(f, "DATABASE_URL must be set"),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from environment variables.
///
/// Reads `DATABASE_URL` (required) and `APP_ENV` (`production` enables the
/// idle-reclaim task; anything else is development). A `.env` file is loaded
/// first when present.
pub fn load_from_env() -> Result<DbConfig, ConfigError> {
    // A missing .env file is fine; deployed processes get real env vars.
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;
    let environment = match env::var("APP_ENV").as_deref() {
        Ok("production") | Ok("prod") => Environment::Production,
        _ => Environment::Development,
    };

    let mut config = DbConfig {
        max_connections: connection_limit_from_url(&database_url),
        database_url,
        environment,
        ..DbConfig::default()
    };
    config.reclaim.enabled = environment.is_production();

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse the `connection_limit` query parameter of a connection string.
///
/// Absent, unparsable or zero values fall back to
/// [`DEFAULT_CONNECTION_LIMIT`].
pub fn connection_limit_from_url(database_url: &str) -> u32 {
    let url = match Url::parse(database_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not parse DATABASE_URL, using the default connection limit"
            );
            return DEFAULT_CONNECTION_LIMIT;
        }
    };

    url.query_pairs()
        .find(|(key, _)| key == "connection_limit")
        .and_then(|(_, value)| value.parse::<u32>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_CONNECTION_LIMIT)
}
