// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the dispatcher and the HTTP server monitor.
//! Sessions are drained before the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop the bot");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Closes every session and waits up to `timeout` for their loops to exit.
///
/// Loops still running at the deadline (a handler stuck on I/O) are aborted.
pub async fn drain_sessions(registry: &SessionRegistry, timeout: Duration) {
    let handles = registry.drain();
    if handles.is_empty() {
        info!("no active sessions to drain");
        return;
    }

    info!(count = handles.len(), "closing sessions");
    let tasks: Vec<_> = handles.into_iter().map(|h| h.close()).collect();
    let aborts: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();

    match tokio::time::timeout(timeout, futures::future::join_all(tasks)).await {
        Ok(_) => info!("all sessions drained successfully"),
        Err(_) => {
            let remaining = aborts.iter().filter(|a| !a.is_finished()).count();
            warn!(remaining, "timeout reached, aborting sessions");
            for abort in aborts {
                abort.abort();
            }
        }
    }
}
