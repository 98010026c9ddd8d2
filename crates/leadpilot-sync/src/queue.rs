//! Per-source queue of normalized scrape targets awaiting batch submission.
//!
//! # Design
//! - One queue per source; offering a target of the other source is an error.
//! - Empty and over-cap batches are rejected before any network call.
//! - A successful submit clears the queue; a failed one keeps it intact.

use std::sync::Arc;

use leadpilot_api_models::{JobId, ScrapeTarget, TargetKind};
use tracing::{info, instrument, warn};

use crate::api::BatchSubmitter;
use crate::context::SyncContext;
use crate::error::QueueError;
use crate::targets::{BulkReport, MergeOutcome, RawTarget, TargetNormalizer, identity_key};

/// Acknowledgement of a queued batch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Backend job id.
    pub job_id: JobId,
    /// Targets carried by the job.
    pub submitted: usize,
    /// Backend confirmation text.
    pub message: String,
}

/// Targets of one source waiting to be submitted.
#[derive(Debug, Clone)]
pub struct TargetQueue {
    kind: TargetKind,
    records: Vec<ScrapeTarget>,
    normalizer: Arc<TargetNormalizer>,
    ctx: SyncContext,
}

impl TargetQueue {
    /// Empty queue for `kind`.
    #[must_use]
    pub fn new(kind: TargetKind, normalizer: Arc<TargetNormalizer>, ctx: SyncContext) -> Self {
        Self {
            kind,
            records: Vec::new(),
            normalizer,
            ctx,
        }
    }

    /// Source of this queue.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Queued targets in insertion order.
    #[must_use]
    pub fn records(&self) -> &[ScrapeTarget] {
        &self.records
    }

    /// Number of queued targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum targets one batch of this source may carry.
    #[must_use]
    pub fn cap(&self) -> usize {
        match self.kind {
            TargetKind::GoogleMaps => self.normalizer.limits().maps_batch_cap,
            TargetKind::Instagram => self.normalizer.limits().instagram_batch_cap,
        }
    }

    /// Add one target from a form.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::KindMismatch`] when `raw` belongs to the other source.
    pub fn add(&mut self, raw: &RawTarget) -> Result<MergeOutcome, QueueError> {
        self.ensure_kind(raw.kind())?;
        let outcome = self.merge(std::slice::from_ref(raw));
        if outcome.rejected_count > 0 {
            self.ctx
                .notices
                .error("Target is missing required fields".to_string());
        } else if outcome.added_count == 0 {
            self.ctx
                .notices
                .error("Target already queued; existing entry updated".to_string());
        } else {
            self.ctx.notices.success(added_message(outcome.added_count));
        }
        Ok(outcome)
    }

    /// Add every valid line of pasted text.
    pub fn add_bulk(&mut self, text: &str) -> BulkReport {
        let (outcome, report) =
            self.normalizer
                .merge_bulk(self.kind, std::mem::take(&mut self.records), text);
        self.records = outcome.queue;
        self.ctx.metrics.set_queued_targets(self.records.len());
        if report.added > 0 {
            self.ctx.notices.success(format!(
                "{}; {} line(s) dropped",
                added_message(report.added),
                report.dropped
            ));
        } else {
            self.ctx.notices.info(format!(
                "No new targets; {} line(s) dropped",
                report.dropped
            ));
        }
        report
    }

    /// Remove the target with identity `key`. Returns whether it was queued.
    pub fn remove(&mut self, key: &str) -> bool {
        let needle = key.to_lowercase();
        let before = self.records.len();
        self.records.retain(|target| identity_key(target) != needle);
        self.ctx.metrics.set_queued_targets(self.records.len());
        self.records.len() != before
    }

    /// Drop every queued target.
    pub fn clear(&mut self) {
        self.records.clear();
        self.ctx.metrics.set_queued_targets(0);
    }

    /// Submit the queue as one batch job.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Empty`] or [`QueueError::OverCap`] without calling
    /// the backend, or [`QueueError::Submit`] when the call fails. The queue is
    /// only cleared on success.
    #[instrument(name = "queue.submit", skip(self, api), fields(kind = %self.kind, queued = self.records.len()))]
    pub async fn submit<B>(&mut self, api: &B) -> Result<SubmitReceipt, QueueError>
    where
        B: BatchSubmitter + ?Sized,
    {
        if self.records.is_empty() {
            self.ctx.metrics.inc_submit("rejected");
            self.ctx.notices.error("Add at least one target before submitting");
            return Err(QueueError::Empty);
        }
        let cap = self.cap();
        if self.records.len() > cap {
            self.ctx.metrics.inc_submit("rejected");
            self.ctx.notices.error(format!(
                "Too many targets: {} queued, {cap} allowed per batch",
                self.records.len()
            ));
            return Err(QueueError::OverCap {
                kind: self.kind,
                len: self.records.len(),
                cap,
            });
        }
        match api.submit_batch(self.kind, &self.records).await {
            Ok(response) => {
                let submitted = self.records.len();
                self.clear();
                info!(job_id = response.job_id, submitted, "batch queued");
                self.ctx.metrics.inc_submit("accepted");
                self.ctx.notices.success(format!(
                    "Queued job #{} with {submitted} target(s)",
                    response.job_id
                ));
                Ok(SubmitReceipt {
                    job_id: response.job_id,
                    submitted,
                    message: response.message,
                })
            }
            Err(source) => {
                warn!(error = %source, "batch submission failed");
                self.ctx.metrics.inc_submit("failed");
                self.ctx
                    .notices
                    .error(format!("Could not queue job: {}", source.describe()));
                Err(QueueError::Submit { source })
            }
        }
    }

    fn ensure_kind(&self, found: TargetKind) -> Result<(), QueueError> {
        if found == self.kind {
            Ok(())
        } else {
            Err(QueueError::KindMismatch {
                expected: self.kind,
                found,
            })
        }
    }

    fn merge(&mut self, incoming: &[RawTarget]) -> MergeOutcome {
        let outcome = self
            .normalizer
            .merge_into(std::mem::take(&mut self.records), incoming);
        self.records.clone_from(&outcome.queue);
        self.ctx.metrics.set_queued_targets(self.records.len());
        outcome
    }
}

fn added_message(count: usize) -> String {
    format!("Added {count} unique target(s)")
}
