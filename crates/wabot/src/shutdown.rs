// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wabot_dispatch::Dispatcher;

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
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
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

/// Waits up to `timeout` for conversation turns still running after the
/// server stopped accepting requests.
pub async fn drain_turns(dispatcher: &Dispatcher, timeout: Duration) {
    let in_flight = dispatcher.in_flight_turns();
    if in_flight == 0 {
        info!("no conversation turns to drain");
        return;
    }

    info!(count = in_flight, "waiting for conversation turns to complete");
    let deadline = tokio::time::Instant::now() + timeout;
    while dispatcher.in_flight_turns() > 0 {
        if tokio::time::Instant::now() >= deadline {
            warn!(
                remaining = dispatcher.in_flight_turns(),
                "drain timeout reached, abandoning remaining turns"
            );
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    info!("all conversation turns drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use wabot_test_utils::TestHarness;

    #[tokio::test]
    async fn drain_returns_immediately_when_idle() {
        let harness = TestHarness::new().await.unwrap();
        let started = std::time::Instant::now();
        drain_turns(harness.pipeline.dispatcher(), Duration::from_secs(5)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
