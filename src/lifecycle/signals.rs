//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT, SIGTERM and SIGUSR1 (Ctrl-C elsewhere)
//! - Translate a received signal into the shutdown broadcast
//! - Disconnect the database client before the process exits
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGUSR1 covers platforms that recycle worker processes with a
//!   user-defined signal
//! - Rust has no "before normal exit" hook; the composition root calls
//!   `Steward::shutdown()` at the end of `main` instead

use std::sync::Arc;

use crate::lifecycle::connector::Connector;
use crate::steward::Steward;

/// Wait for a termination signal, then tear the steward down.
///
/// Spawned by [`Steward::start_background_tasks`]; can also be spawned
/// directly by a composition root that manages its own task set.
pub async fn listen_for_signals<C: Connector>(steward: Arc<Steward<C>>) {
    wait_for_signal().await;
    tracing::info!("Termination signal received, shutting down database steward");
    steward.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut interrupt, mut terminate, mut user_defined) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::user_defined1()),
    ) {
        (Ok(i), Ok(t), Ok(u)) => (i, t, u),
        _ => {
            tracing::error!("Failed to register signal handlers");
            return;
        }
    };

    tokio::select! {
        _ = interrupt.recv() => tracing::debug!("SIGINT received"),
        _ = terminate.recv() => tracing::debug!("SIGTERM received"),
        _ = user_defined.recv() => tracing::debug!("SIGUSR1 received"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
}
