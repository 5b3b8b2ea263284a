//! Exponential backoff schedule.

use std::time::Duration;

/// Delay before re-running attempt `attempt` (0-indexed).
///
/// Deterministic: `min(base * 2^attempt, cap)`. Retry counts are small and
/// per-process, so the schedule carries no jitter and tests can assert it
/// exactly.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    let cap_ms = cap.as_millis() as u64;

    let factor = 2u64.saturating_pow(attempt);
    let delay_ms = base_ms.saturating_mul(factor).min(cap_ms);

    Duration::from_millis(delay_ms)
}
