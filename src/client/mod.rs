//! Configuration Client
//!
//! Owns a [`Repository`], loads it once up front and keeps it fresh from a
//! background task until the client is closed or its parent token is
//! cancelled.

pub mod accessors;

pub use accessors::Lookup;

use crate::error::ClientError;
use crate::metrics::{RefreshMetrics, RefreshStats};
use crate::source::Repository;
use crate::value::Snapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Refresh interval used by [`ClientBuilder`] when none is given
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Handle to a running configuration client
///
/// Cloning is cheap and every clone shares the same repository, background
/// task and closed state. Dropping clones does not stop the background task;
/// call [`Client::close`] or cancel the parent token.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    id: Uuid,
    source_name: String,
    repository: Arc<dyn Repository>,
    refresh_interval: Duration,
    closed: AtomicBool,
    cancel: CancellationToken,
    // Cancelled by the background task when it exits
    finished: CancellationToken,
    metrics: Arc<RefreshMetrics>,
}

impl Client {
    /// Create a client, refreshing the repository once before returning
    ///
    /// Fails without starting a background task if the initial refresh
    /// fails. On success the client becomes the process-wide default used by
    /// [`crate::global`].
    pub async fn new<R>(
        parent: &CancellationToken,
        repository: R,
        refresh_interval: Duration,
    ) -> Result<Self, ClientError>
    where
        R: Repository + 'static,
    {
        ClientBuilder::new(repository)
            .parent(parent.clone())
            .refresh_interval(refresh_interval)
            .build()
            .await
    }

    pub fn builder<R>(repository: R) -> ClientBuilder
    where
        R: Repository + 'static,
    {
        ClientBuilder::new(repository)
    }

    /// Stop background refreshing and reject further reads
    ///
    /// Idempotent. Returns before the background task has necessarily
    /// exited; await [`Client::closed`] for that. The repository itself is
    /// kept alive as long as any clone of this client exists.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            info!(client_id = %self.inner.id, "Closing configuration client for {}", self.inner.source_name);
        }
        self.inner.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Wait until the background refresh task has exited
    pub async fn closed(&self) {
        self.inner.finished.cancelled().await;
    }

    /// Run one refresh now, outside the regular schedule
    pub async fn refresh_now(&self) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        match self.inner.repository.refresh().await {
            Ok(()) => {
                self.inner.metrics.record_success();
                Ok(())
            }
            Err(e) => {
                self.inner.metrics.record_failure();
                error!(client_id = %self.inner.id, "Error refreshing repository: {}", e);
                Err(ClientError::Refresh(e))
            }
        }
    }

    /// Whole current snapshot, when the repository exposes one
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        if self.is_closed() {
            return None;
        }
        self.inner.repository.snapshot()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn source_name(&self) -> &str {
        &self.inner.source_name
    }

    pub fn refresh_interval(&self) -> Duration {
        self.inner.refresh_interval
    }

    pub fn stats(&self) -> RefreshStats {
        self.inner.metrics.snapshot()
    }

    pub fn metrics(&self) -> &RefreshMetrics {
        &self.inner.metrics
    }

    pub(crate) fn repository(&self) -> &dyn Repository {
        self.inner.repository.as_ref()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.inner.id)
            .field("source", &self.inner.source_name)
            .field("refresh_interval", &self.inner.refresh_interval)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Configures and constructs a [`Client`]
pub struct ClientBuilder {
    repository: Arc<dyn Repository>,
    parent: Option<CancellationToken>,
    refresh_interval: Duration,
    register_default: bool,
}

impl ClientBuilder {
    pub fn new<R>(repository: R) -> Self
    where
        R: Repository + 'static,
    {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<dyn Repository>) -> Self {
        Self {
            repository,
            parent: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            register_default: true,
        }
    }

    /// Cancelling `parent` stops the client's background task
    pub fn parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Whether the built client replaces the process-wide default
    pub fn register_default(mut self, register: bool) -> Self {
        self.register_default = register;
        self
    }

    pub async fn build(self) -> Result<Client, ClientError> {
        if self.refresh_interval.is_zero() {
            return Err(ClientError::InvalidInterval);
        }

        let cancel = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let id = Uuid::new_v4();
        let source_name = self.repository.name();
        let metrics = Arc::new(RefreshMetrics::new());

        if let Err(e) = self.repository.refresh().await {
            error!(client_id = %id, "Error refreshing repository {}: {}", source_name, e);
            return Err(ClientError::InitialRefresh {
                source_name,
                source: e,
            });
        }
        metrics.record_success();

        let finished = CancellationToken::new();
        let span = info_span!("config_refresh", client_id = %id, source = %source_name);
        tokio::spawn(
            refresh_loop(
                Arc::clone(&self.repository),
                self.refresh_interval,
                cancel.clone(),
                Arc::clone(&metrics),
                finished.clone().drop_guard(),
            )
            .instrument(span),
        );

        let client = Client {
            inner: Arc::new(ClientInner {
                id,
                source_name,
                repository: self.repository,
                refresh_interval: self.refresh_interval,
                closed: AtomicBool::new(false),
                cancel,
                finished,
                metrics,
            }),
        };

        if self.register_default {
            crate::global::set_default(client.clone());
        }

        info!(
            client_id = %id,
            "Configuration client started for {} (refresh every {})",
            client.source_name(),
            humantime::format_duration(client.refresh_interval())
        );
        Ok(client)
    }
}

/// Refresh the repository on every tick until `cancel` fires
///
/// A slow refresh delays the next tick; missed ticks are skipped rather than
/// replayed. Cancellation never interrupts a refresh already in flight.
async fn refresh_loop(
    repository: Arc<dyn Repository>,
    period: Duration,
    cancel: CancellationToken,
    metrics: Arc<RefreshMetrics>,
    _finished: DropGuard,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Refresh loop cancelled");
                break;
            }
            _ = ticker.tick() => {
                match repository.refresh().await {
                    Ok(()) => {
                        metrics.record_success();
                        debug!("Configuration refreshed");
                    }
                    Err(e) => {
                        metrics.record_failure();
                        error!("Error refreshing repository: {}", e);
                    }
                }
            }
        }
    }
}
