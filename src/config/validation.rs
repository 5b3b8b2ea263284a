//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits ≥ 1, intervals > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: `DbConfig → Result<(), Vec<ValidationError>>`
//! - Runs before a config is accepted by the loader

use crate::config::schema::DbConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingDatabaseUrl,
    ZeroMaxConnections,
    ZeroReclaimInterval,
    BackoffCapBelowBase { base_ms: u64, cap_ms: u64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingDatabaseUrl => write!(f, "database_url is empty"),
            ValidationError::ZeroMaxConnections => write!(f, "max_connections must be at least 1"),
            ValidationError::ZeroReclaimInterval => {
                write!(f, "reclaim.interval_ms must be greater than 0")
            }
            ValidationError::BackoffCapBelowBase { base_ms, cap_ms } => write!(
                f,
                "retry.max_delay_ms ({cap_ms}) is below retry.base_delay_ms ({base_ms})"
            ),
        }
    }
}

/// Check a configuration for semantic problems, collecting every failure.
pub fn validate_config(config: &DbConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database_url.is_empty() {
        errors.push(ValidationError::MissingDatabaseUrl);
    }
    if config.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.reclaim.enabled && config.reclaim.interval_ms == 0 {
        errors.push(ValidationError::ZeroReclaimInterval);
    }
    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        errors.push(ValidationError::BackoffCapBelowBase {
            base_ms: config.retry.base_delay_ms,
            cap_ms: config.retry.max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DbConfig {
        DbConfig {
            database_url: "postgres://localhost:5432/app".to_string(),
            ..DbConfig::default()
        }
    }

    #[test]
    fn accepts_a_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn collects_every_problem() {
        let mut config = valid_config();
        config.database_url.clear();
        config.max_connections = 0;
        config.retry.base_delay_ms = 500;
        config.retry.max_delay_ms = 100;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::MissingDatabaseUrl));
        assert!(errors.contains(&ValidationError::ZeroMaxConnections));
    }

    #[test]
    fn disabled_reclaim_skips_interval_check() {
        let mut config = valid_config();
        config.reclaim.enabled = false;
        config.reclaim.interval_ms = 0;
        assert!(validate_config(&config).is_ok());
    }
}
