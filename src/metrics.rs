//! Refresh Metrics
//!
//! Per-client refresh counters, exported in Prometheus text format.

use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Point-in-time copy of the refresh counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub attempts: u64,
    pub failures: u64,
    /// Seconds since the Unix epoch, `None` until the first success
    pub last_success_unix: Option<u64>,
}

impl RefreshStats {
    pub fn successes(&self) -> u64 {
        self.attempts - self.failures
    }
}

/// Collects refresh outcomes for one client
#[derive(Debug)]
pub struct RefreshMetrics {
    registry: Registry,

    // Prometheus metrics
    refresh_total: IntCounter,
    refresh_failures_total: IntCounter,
    last_success_timestamp: Gauge,

    // Internal counters
    attempts: AtomicU64,
    failures: AtomicU64,
    last_success_unix: AtomicU64,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let refresh_total = IntCounter::new(
            "remote_config_refresh_total",
            "Total number of configuration refresh attempts",
        )
        .expect("metric name and help are valid");

        let refresh_failures_total = IntCounter::new(
            "remote_config_refresh_failures_total",
            "Total number of failed configuration refreshes",
        )
        .expect("metric name and help are valid");

        let last_success_timestamp = Gauge::new(
            "remote_config_last_refresh_success_timestamp_seconds",
            "Unix timestamp of the last successful configuration refresh",
        )
        .expect("metric name and help are valid");

        for collector in [
            Box::new(refresh_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(refresh_failures_total.clone()),
            Box::new(last_success_timestamp.clone()),
        ] {
            if let Err(e) = registry.register(collector) {
                warn!("Failed to register refresh metric: {}", e);
            }
        }

        Self {
            registry,
            refresh_total,
            refresh_failures_total,
            last_success_timestamp,
            attempts: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            last_success_unix: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self) {
        self.refresh_total.inc();
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.last_success_unix.store(now, Ordering::Relaxed);
        self.last_success_timestamp.set(now as f64);
    }

    pub fn record_failure(&self) {
        self.refresh_total.inc();
        self.refresh_failures_total.inc();
        // Bump failures first so a concurrent snapshot never sees more
        // failures than attempts.
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RefreshStats {
        let failures = self.failures.load(Ordering::Relaxed);
        let attempts = self.attempts.load(Ordering::Relaxed).max(failures);
        let last_success = self.last_success_unix.load(Ordering::Relaxed);
        RefreshStats {
            attempts,
            failures,
            last_success_unix: (last_success > 0).then_some(last_success),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all refresh metrics in the Prometheus text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            warn!("Failed to encode refresh metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for RefreshMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_outcomes() {
        let metrics = RefreshMetrics::new();
        assert_eq!(metrics.snapshot(), RefreshStats::default());

        metrics.record_success();
        metrics.record_failure();
        metrics.record_success();

        let stats = metrics.snapshot();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.successes(), 2);
        assert!(stats.last_success_unix.is_some());
    }

    #[test]
    fn test_render_prometheus_text() {
        let metrics = RefreshMetrics::new();
        metrics.record_failure();

        let text = metrics.render();
        assert!(text.contains("remote_config_refresh_total 1"));
        assert!(text.contains("remote_config_refresh_failures_total 1"));
        assert!(text.contains("# TYPE remote_config_last_refresh_success_timestamp_seconds gauge"));
    }
}
