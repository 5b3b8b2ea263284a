//! Failure classification.
//!
//! # Responsibilities
//! - Map SQLSTATE codes to a failure category and retry eligibility
//! - Fall back to message substrings when the driver reports no code
//! - Stay pure: no state, no side effects
//!
//! # Design Decisions
//! - Codes win over message text; the fallback runs only when no code is present
//! - Timeout substrings are checked before connection substrings, so a
//!   message like "connection timed out" classifies as a timeout
//! - Unmatched failures are permanent; only known-transient shapes retry

use crate::error::ErrorCategory;

/// Serialization conflicts and deadlocks. The transaction can be re-run.
const SERIALIZATION_CODES: &[&str] = &["40001", "40P01"];

/// Connection-level failures, including server shutdown states.
const CONNECTION_CODES: &[&str] = &[
    "08000", "08001", "08003", "08006", "57P01", "57P02", "57P03",
];

/// Cancelled/timed-out statements.
const TIMEOUT_CODES: &[&str] = &["57014"];

const TIMEOUT_MARKERS: &[&str] = &["timed out", "timeout", "etimedout"];
const CONNECTION_MARKERS: &[&str] = &["connection", "econnrefused"];

/// Outcome of classifying one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Which category the failure falls into.
    pub category: ErrorCategory,
    /// Whether the retry orchestrator may re-run the operation.
    pub retryable: bool,
}

impl Classification {
    fn transient(category: ErrorCategory) -> Self {
        Self { category, retryable: true }
    }

    fn permanent() -> Self {
        Self { category: ErrorCategory::Other, retryable: false }
    }
}

/// A driver failure the orchestrator can classify.
///
/// Implemented for `sqlx::Error`; test harnesses implement it for injected
/// error types.
pub trait Failure: std::error::Error + Send + Sync + 'static {
    /// Driver-specific error code (SQLSTATE for PostgreSQL), when available.
    fn code(&self) -> Option<String> {
        None
    }
}

impl Failure for sqlx::Error {
    fn code(&self) -> Option<String> {
        match self {
            sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
            _ => None,
        }
    }
}

/// Classify a raw failure by code, falling back to message substrings.
pub fn classify(code: Option<&str>, message: &str) -> Classification {
    if let Some(code) = code {
        if SERIALIZATION_CODES.contains(&code) {
            return Classification::transient(ErrorCategory::Serialization);
        }
        if CONNECTION_CODES.contains(&code) {
            return Classification::transient(ErrorCategory::Connection);
        }
        if TIMEOUT_CODES.contains(&code) {
            return Classification::transient(ErrorCategory::Timeout);
        }
        return Classification::permanent();
    }

    let message = message.to_ascii_lowercase();
    if TIMEOUT_MARKERS.iter().any(|marker| message.contains(marker)) {
        return Classification::transient(ErrorCategory::Timeout);
    }
    if CONNECTION_MARKERS.iter().any(|marker| message.contains(marker)) {
        return Classification::transient(ErrorCategory::Connection);
    }

    Classification::permanent()
}

/// Classify a [`Failure`] value.
pub fn classify_failure<E: Failure>(error: &E) -> Classification {
    classify(error.code().as_deref(), &error.to_string())
}
