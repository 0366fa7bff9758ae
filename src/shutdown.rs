//! Graceful Shutdown Handling
//!
//! Ties process signals (SIGTERM, SIGINT, Ctrl+C) to a root cancellation
//! token. Clients built with a child of that token stop refreshing when the
//! process is asked to stop.

use crate::client::Client;
use crate::Result;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shutdown coordinator that owns the root cancellation token
pub struct ShutdownCoordinator {
    root: CancellationToken,
    /// How long to wait for clients to stop once shutdown starts
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            root: CancellationToken::new(),
            timeout,
        }
    }

    /// Token to pass as the parent of every client
    pub fn token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Cancel everything bound to the root token
    pub fn trigger(&self) {
        self.root.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Wait for SIGTERM/SIGINT/Ctrl+C, then cancel the root token
    ///
    /// Returns early without a signal if the root token is cancelled by
    /// other means.
    pub async fn listen_for_signals(&self) -> Result<()> {
        info!("Starting shutdown signal listener");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
                _ = self.root.cancelled() => {
                    return Ok(());
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                res = signal::ctrl_c() => {
                    res?;
                    info!("Received Ctrl+C, initiating graceful shutdown");
                }
                _ = self.root.cancelled() => {
                    return Ok(());
                }
            }
        }

        self.trigger();
        Ok(())
    }

    /// Close `client` and wait for its refresh task to exit
    pub async fn shutdown_client(&self, client: &Client) -> Result<()> {
        client.close();

        if tokio::time::timeout(self.timeout, client.closed())
            .await
            .is_err()
        {
            warn!(
                "Refresh task for {} still running after {:?}",
                client.source_name(),
                self.timeout
            );
            anyhow::bail!("Shutdown completion timeout");
        }

        info!("Configuration client for {} stopped", client.source_name());
        Ok(())
    }
}
