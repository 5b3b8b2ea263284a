//! Error taxonomy and the enriched error surfaced to callers.

use std::time::Duration;

use thiserror::Error;

/// Broad failure categories, mutually exclusive.
///
/// The classifier assigns exactly one category per failure; the metrics
/// registry counts terminal failures per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The client could not be established or maintained.
    Connection,
    /// An operation or acquire timeout.
    Timeout,
    /// A transaction conflict (serialization failure, deadlock). Retryable.
    Serialization,
    /// Anything unclassified. Treated as permanent.
    Other,
}

impl ErrorCategory {
    /// Stable lowercase name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Connection => "connection",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Serialization => "serialization",
            ErrorCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal database error carrying the original cause and retry context.
///
/// Produced by the retry orchestrator when an error is permanent or retries
/// are exhausted. Transient failures that eventually succeed are never
/// surfaced. The calling layer decides how to present this; the core only
/// decides whether a failure was retryable.
#[derive(Debug, Error)]
#[error("database operation '{context}' failed after {attempts} attempt(s) in {elapsed:?}: {source}")]
pub struct DbError {
    /// Classified failure category.
    pub category: ErrorCategory,
    /// Whether the final failure was classified as transient.
    pub retryable: bool,
    /// Operation name supplied by the caller.
    pub context: String,
    /// Total attempts made, including the first.
    pub attempts: u32,
    /// Wall time from first attempt to terminal failure.
    pub elapsed: Duration,
    /// The underlying driver/operation error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl DbError {
    /// Whether the terminal failure was in a transient category.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}
