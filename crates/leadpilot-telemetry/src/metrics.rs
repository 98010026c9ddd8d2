//! Prometheus-backed counters for the sync components.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Outcomes are labels, not separate metrics, so dashboards can stack them.
//! - Cheap to clone; every component holds its own handle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus registry shared by the list, mutation, poll and queue components.
#[derive(Clone)]
pub struct SyncMetrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    fetch_total: IntCounterVec,
    mutation_total: IntCounterVec,
    poll_tick_total: IntCounterVec,
    submit_total: IntCounterVec,
    queued_targets: IntGauge,
    last_fetch_latency_ms: IntGauge,
}

impl fmt::Debug for SyncMetrics {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("SyncMetrics").finish_non_exhaustive()
    }
}

/// Point-in-time view of the gauges, used by status output.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Targets currently waiting in the submission queue.
    pub queued_targets: i64,
    /// Latency of the most recent page fetch (ms).
    pub last_fetch_latency_ms: i64,
}

impl SyncMetrics {
    /// Construct a registry with the sync collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let fetch_total = counter_vec(
            "leadpilot_fetch_total",
            "Page fetches by outcome",
            &["outcome"],
        )?;
        let mutation_total = counter_vec(
            "leadpilot_mutation_total",
            "Optimistic mutations by field and outcome",
            &["field", "outcome"],
        )?;
        let poll_tick_total = counter_vec(
            "leadpilot_poll_tick_total",
            "Polling ticks by outcome",
            &["outcome"],
        )?;
        let submit_total = counter_vec(
            "leadpilot_submit_total",
            "Batch target submissions by outcome",
            &["outcome"],
        )?;
        let queued_targets = gauge("leadpilot_queued_targets", "Targets waiting for submission")?;
        let last_fetch_latency_ms = gauge(
            "leadpilot_last_fetch_latency_ms",
            "Latency of the most recent page fetch (ms)",
        )?;

        register(&registry, "leadpilot_fetch_total", &fetch_total)?;
        register(&registry, "leadpilot_mutation_total", &mutation_total)?;
        register(&registry, "leadpilot_poll_tick_total", &poll_tick_total)?;
        register(&registry, "leadpilot_submit_total", &submit_total)?;
        register(&registry, "leadpilot_queued_targets", &queued_targets)?;
        register(
            &registry,
            "leadpilot_last_fetch_latency_ms",
            &last_fetch_latency_ms,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                fetch_total,
                mutation_total,
                poll_tick_total,
                submit_total,
                queued_targets,
                last_fetch_latency_ms,
            }),
        })
    }

    /// Count a page fetch outcome (`applied`, `superseded`, `failed`).
    pub fn inc_fetch(&self, outcome: &str) {
        self.inner.fetch_total.with_label_values(&[outcome]).inc();
    }

    /// Count a mutation outcome for the named field.
    pub fn inc_mutation(&self, field: &str, outcome: &str) {
        self.inner
            .mutation_total
            .with_label_values(&[field, outcome])
            .inc();
    }

    /// Count a polling tick outcome.
    pub fn inc_poll_tick(&self, outcome: &str) {
        self.inner.poll_tick_total.with_label_values(&[outcome]).inc();
    }

    /// Count a batch submission outcome.
    pub fn inc_submit(&self, outcome: &str) {
        self.inner.submit_total.with_label_values(&[outcome]).inc();
    }

    /// Set the queued-target gauge.
    pub fn set_queued_targets(&self, count: usize) {
        self.inner
            .queued_targets
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record the latency of a completed fetch.
    pub fn observe_fetch_latency(&self, duration: Duration) {
        self.inner
            .last_fetch_latency_ms
            .set(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
    }

    /// Read a single counter value, mainly for assertions and status output.
    #[must_use]
    pub fn fetch_count(&self, outcome: &str) -> u64 {
        self.inner.fetch_total.with_label_values(&[outcome]).get()
    }

    /// Read a mutation counter value.
    #[must_use]
    pub fn mutation_count(&self, field: &str, outcome: &str) -> u64 {
        self.inner
            .mutation_total
            .with_label_values(&[field, outcome])
            .get()
    }

    /// Read a polling counter value.
    #[must_use]
    pub fn poll_tick_count(&self, outcome: &str) -> u64 {
        self.inner.poll_tick_total.with_label_values(&[outcome]).get()
    }

    /// Read a submission counter value.
    #[must_use]
    pub fn submit_count(&self, outcome: &str) -> u64 {
        self.inner.submit_total.with_label_values(&[outcome]).get()
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the gauges.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queued_targets: self.inner.queued_targets.get(),
            last_fetch_latency_ms: self.inner.last_fetch_latency_ms.get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_rendered_with_labels() -> Result<()> {
        let metrics = SyncMetrics::new()?;
        metrics.inc_fetch("applied");
        metrics.inc_fetch("applied");
        metrics.inc_mutation("status", "rolled_back");
        metrics.inc_poll_tick("skipped_hidden");

        assert_eq!(metrics.fetch_count("applied"), 2);
        assert_eq!(metrics.mutation_count("status", "rolled_back"), 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("leadpilot_fetch_total{outcome=\"applied\"} 2"));
        assert!(rendered.contains("leadpilot_poll_tick_total{outcome=\"skipped_hidden\"} 1"));
        Ok(())
    }

    #[test]
    fn gauges_show_up_in_snapshot() -> Result<()> {
        let metrics = SyncMetrics::new()?;
        metrics.set_queued_targets(3);
        metrics.observe_fetch_latency(Duration::from_millis(42));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queued_targets, 3);
        assert_eq!(snapshot.last_fetch_latency_ms, 42);
        Ok(())
    }

    #[test]
    fn snapshot_serializes_field_names() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let metrics = SyncMetrics::new()?;
        metrics.set_queued_targets(2);
        let encoded = serde_json::to_value(metrics.snapshot())?;
        assert_eq!(encoded["queued_targets"], 2);
        assert_eq!(encoded["last_fetch_latency_ms"], 0);
        Ok(())
    }

    #[test]
    fn clones_share_the_registry() -> Result<()> {
        let metrics = SyncMetrics::new()?;
        let clone = metrics.clone();
        clone.inc_submit("accepted");
        assert_eq!(metrics.submit_count("accepted"), 1);
        Ok(())
    }
}
