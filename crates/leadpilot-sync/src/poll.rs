//! Background refresh on a fixed interval.
//!
//! # Design
//! - One loop task per scheduler; `stop` aborts it and is safe to repeat.
//! - Refreshes run in their own task guarded by an in-flight flag, so a slow
//!   refresh makes later ticks no-ops instead of stacking calls.
//! - Hidden views skip ticks; becoming visible again triggers one immediate
//!   refresh under the same guard.
//! - In-flight refreshes are left to finish when the scheduler stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use leadpilot_telemetry::SyncMetrics;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::error::ApiResult;

/// Refresh callback invoked on each effective tick.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, ApiResult<()>> + Send + Sync>;

/// Whether the view driving the scheduler is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// On screen; ticks refresh.
    #[default]
    Visible,
    /// Off screen; ticks are skipped.
    Hidden,
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    /// A refresh is currently executing.
    pub in_flight: bool,
    /// Completion time of the last successful refresh.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// The tick loop is active.
    pub running: bool,
}

/// Whether data last synced at `last_synced_at` is older than `threshold`.
///
/// Data that never synced is stale.
#[must_use]
pub fn is_stale(
    last_synced_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: Duration,
) -> bool {
    let Some(synced) = last_synced_at else {
        return true;
    };
    let threshold = chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::MAX);
    now.signed_duration_since(synced) > threshold
}

#[derive(Debug, Default)]
struct Shared {
    in_flight: AtomicBool,
    last_synced_at: Mutex<Option<DateTime<Utc>>>,
}

impl Shared {
    fn last_synced(&self) -> MutexGuard<'_, Option<DateTime<Utc>>> {
        self.last_synced_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Repeating refresh driver for one view.
pub struct PollingScheduler {
    period: Duration,
    visibility: watch::Receiver<Visibility>,
    shared: Arc<Shared>,
    metrics: SyncMetrics,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollingScheduler {
    /// Create a stopped scheduler.
    #[must_use]
    pub fn new(
        period: Duration,
        visibility: watch::Receiver<Visibility>,
        metrics: SyncMetrics,
    ) -> Self {
        Self {
            period,
            visibility,
            shared: Arc::new(Shared::default()),
            metrics,
            task: Mutex::new(None),
        }
    }

    /// Begin ticking; the first tick fires one period from now.
    ///
    /// Restarts the loop when already running. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, refresh: RefreshFn) {
        self.stop();
        let runner = Runner {
            period: self.period,
            visibility: self.visibility.clone(),
            shared: Arc::clone(&self.shared),
            metrics: self.metrics.clone(),
            refresh,
        };
        let handle = tokio::spawn(runner.run());
        *self.lock_task() = Some(handle);
    }

    /// Stop ticking and detach from visibility changes. Idempotent.
    pub fn stop(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
            debug!("polling stopped");
        }
    }

    /// Current scheduler state.
    #[must_use]
    pub fn state(&self) -> PollState {
        PollState {
            in_flight: self.shared.in_flight.load(Ordering::Acquire),
            last_synced_at: *self.shared.last_synced(),
            running: self
                .lock_task()
                .as_ref()
                .is_some_and(|handle| !handle.is_finished()),
        }
    }

    /// Whether the last successful refresh is older than `threshold`.
    #[must_use]
    pub fn is_stale(&self, threshold: Duration) -> bool {
        is_stale(*self.shared.last_synced(), Utc::now(), threshold)
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Runner {
    period: Duration,
    visibility: watch::Receiver<Visibility>,
    shared: Arc<Shared>,
    metrics: SyncMetrics,
    refresh: RefreshFn,
}

impl Runner {
    async fn run(mut self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shown = *self.visibility.borrow_and_update();
        let mut listening = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if shown == Visibility::Hidden {
                        debug!("tick skipped while hidden");
                        self.metrics.inc_poll_tick("skipped_hidden");
                    } else {
                        self.fire();
                    }
                }
                changed = self.visibility.changed(), if listening => {
                    if changed.is_err() {
                        listening = false;
                        continue;
                    }
                    let now = *self.visibility.borrow_and_update();
                    if shown == Visibility::Hidden && now == Visibility::Visible {
                        debug!("view visible again; refreshing now");
                        self.fire();
                    }
                    shown = now;
                }
            }
        }
    }

    fn fire(&self) {
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("tick skipped; refresh still in flight");
            self.metrics.inc_poll_tick("skipped_in_flight");
            return;
        }
        let shared = Arc::clone(&self.shared);
        let metrics = self.metrics.clone();
        let refresh = (self.refresh)();
        tokio::spawn(async move {
            match refresh.await {
                Ok(()) => {
                    *shared.last_synced() = Some(Utc::now());
                    metrics.inc_poll_tick("refreshed");
                }
                Err(err) => {
                    warn!(error = %err, "background refresh failed");
                    metrics.inc_poll_tick("failed");
                }
            }
            shared.in_flight.store(false, Ordering::Release);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_synced_is_stale() {
        assert!(is_stale(None, Utc::now(), Duration::from_secs(60)));
    }

    #[test]
    fn staleness_is_strictly_greater_than_threshold() {
        let now = Utc::now();
        let at_edge = now - chrono::Duration::seconds(60);
        let past_edge = now - chrono::Duration::seconds(61);
        assert!(!is_stale(Some(at_edge), now, Duration::from_secs(60)));
        assert!(is_stale(Some(past_edge), now, Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn stop_before_start_is_harmless() -> Result<(), leadpilot_telemetry::TelemetryError> {
        let (_tx, rx) = watch::channel(Visibility::Visible);
        let scheduler = PollingScheduler::new(Duration::from_secs(5), rx, SyncMetrics::new()?);
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.state().running);
        assert!(scheduler.is_stale(Duration::from_secs(30)));
        Ok(())
    }
}
