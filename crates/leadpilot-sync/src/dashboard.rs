//! Polled dashboard counters.
//!
//! # Design
//! - Same commit rules as the list controller: fenced by request token, the
//!   previous counters stay visible when a refresh fails.
//! - Exposes a [`RefreshFn`] so a [`crate::PollingScheduler`] can drive it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use leadpilot_api_models::LeadStats;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::api::StatsSource;
use crate::context::SyncContext;
use crate::list::LoadOutcome;
use crate::poll::{RefreshFn, is_stale};

/// Last committed dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    /// Counters from the last successful refresh.
    pub stats: Option<LeadStats>,
    /// When they were committed.
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    view: DashboardState,
    latest_token: u64,
}

/// Keeps the dashboard counters in sync with the backend.
pub struct DashboardMonitor<S: ?Sized> {
    source: Arc<S>,
    inner: Arc<Mutex<Inner>>,
    revision: Arc<watch::Sender<u64>>,
    ctx: SyncContext,
}

impl<S: ?Sized> Clone for DashboardMonitor<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            inner: Arc::clone(&self.inner),
            revision: Arc::clone(&self.revision),
            ctx: self.ctx.clone(),
        }
    }
}

impl<S: StatsSource + ?Sized> DashboardMonitor<S> {
    /// Monitor with no counters loaded yet.
    #[must_use]
    pub fn new(source: Arc<S>, ctx: SyncContext) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            source,
            inner: Arc::new(Mutex::new(Inner::default())),
            revision: Arc::new(revision),
            ctx,
        }
    }

    /// Clone of the committed counters.
    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        self.lock().view.clone()
    }

    /// Receiver that changes whenever new counters are committed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Whether the counters are older than `threshold`.
    #[must_use]
    pub fn is_stale(&self, threshold: Duration) -> bool {
        is_stale(self.lock().view.last_synced_at, Utc::now(), threshold)
    }

    /// Fetch fresh counters and commit them if no newer refresh was issued.
    #[instrument(name = "dashboard.refresh", skip(self))]
    pub async fn refresh(&self) -> LoadOutcome {
        let token = {
            let mut inner = self.lock();
            inner.latest_token += 1;
            inner.latest_token
        };
        let started = Instant::now();
        let result = self.source.lead_stats().await;
        self.ctx.metrics.observe_fetch_latency(started.elapsed());

        let mut inner = self.lock();
        if inner.latest_token != token {
            debug!(token, "discarded superseded stats response");
            self.ctx.metrics.inc_fetch("superseded");
            return LoadOutcome::Superseded;
        }
        match result {
            Ok(stats) => {
                info!(total = stats.total_leads, "dashboard counters committed");
                inner.view = DashboardState {
                    stats: Some(stats),
                    last_synced_at: Some(Utc::now()),
                };
                drop(inner);
                self.ctx.metrics.inc_fetch("applied");
                self.revision.send_modify(|revision| *revision += 1);
                LoadOutcome::Applied
            }
            Err(err) => {
                drop(inner);
                warn!(error = %err, "dashboard refresh failed");
                self.ctx.metrics.inc_fetch("failed");
                self.ctx
                    .notices
                    .error(format!("Could not load dashboard: {}", err.describe()));
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Refresh callback suitable for a [`crate::PollingScheduler`].
    #[must_use]
    pub fn poll_refresh(&self) -> RefreshFn {
        let monitor = self.clone();
        Arc::new(move || {
            let monitor = monitor.clone();
            async move { monitor.refresh().await.into_result() }.boxed()
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
