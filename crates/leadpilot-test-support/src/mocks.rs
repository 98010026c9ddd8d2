//! Scriptable in-memory implementations of the sync collaborator traits.
//!
//! Failures and gates are queued per operation and consumed in call order, so
//! a test can say "the second status update fails" or "hold the first fetch
//! until I release it" without timing tricks.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use leadpilot_api_models::{
    GuestPreviewRequest, GuestPreviewResponse, GuestUsage, HIGH_PRIORITY_SCORE, JobFilter,
    JobId, JobSummary, Lead, LeadFilter, LeadId, LeadSource, LeadStats, LeadStatus, PageSlice,
    ScrapeResponse, ScrapeTarget, TargetKind,
};
use leadpilot_sync::{
    ApiError, ApiResult, BatchSubmitter, BulkDelete, HealthProbe, JobLookup, LeadMutations,
    PageSource, PreviewSource, StatsSource, demo_leads,
};
use tokio::sync::oneshot;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle that releases one held call.
#[derive(Debug)]
pub struct Gate {
    release: oneshot::Sender<()>,
}

impl Gate {
    fn pair() -> (Self, oneshot::Receiver<()>) {
        let (release, held) = oneshot::channel();
        (Self { release }, held)
    }

    /// Let the held call proceed.
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

/// Arguments of one `fetch_page` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    /// Filter requested.
    pub filter: LeadFilter,
    /// Row offset requested.
    pub offset: u64,
    /// Row limit requested.
    pub limit: u32,
}

#[derive(Debug, Default)]
struct Script {
    failures: Mutex<VecDeque<Option<ApiError>>>,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl Script {
    fn fail_next(&self, err: ApiError) {
        lock(&self.failures).push_back(Some(err));
    }

    fn succeed_next(&self) {
        lock(&self.failures).push_back(None);
    }

    fn hold_next(&self) -> Gate {
        let (gate, held) = Gate::pair();
        lock(&self.gates).push_back(held);
        gate
    }

    async fn enter(&self) -> Option<ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = lock(&self.failures).pop_front().flatten();
        let gate = lock(&self.gates).pop_front();
        if let Some(held) = gate {
            let _ = held.await;
        }
        failure
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// In-memory leads backend.
#[derive(Debug)]
pub struct FakeLeadApi {
    leads: Mutex<Vec<Lead>>,
    fetches: Mutex<Vec<FetchCall>>,
    submissions: Mutex<Vec<(TargetKind, Vec<ScrapeTarget>)>>,
    fetch: Script,
    status: Script,
    delete: Script,
    submit: Script,
    preview: Script,
    stats: Script,
    healthy: AtomicBool,
    probe_delay: Mutex<Option<Duration>>,
    next_job_id: AtomicUsize,
}

impl FakeLeadApi {
    /// Backend holding `leads`.
    #[must_use]
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads: Mutex::new(leads),
            fetches: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            fetch: Script::default(),
            status: Script::default(),
            delete: Script::default(),
            submit: Script::default(),
            preview: Script::default(),
            stats: Script::default(),
            healthy: AtomicBool::new(true),
            probe_delay: Mutex::new(None),
            next_job_id: AtomicUsize::new(100),
        }
    }

    /// Current server-side rows.
    #[must_use]
    pub fn leads(&self) -> Vec<Lead> {
        lock(&self.leads).clone()
    }

    /// Replace server-side rows.
    pub fn set_leads(&self, leads: Vec<Lead>) {
        *lock(&self.leads) = leads;
    }

    /// Server-side status of one lead.
    #[must_use]
    pub fn status_of(&self, id: LeadId) -> Option<LeadStatus> {
        lock(&self.leads)
            .iter()
            .find(|lead| lead.id == id)
            .map(|lead| lead.status)
    }

    /// Every `fetch_page` call so far.
    #[must_use]
    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        lock(&self.fetches).clone()
    }

    /// Number of `fetch_page` calls so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch.calls()
    }

    /// Number of `update_status` calls so far.
    #[must_use]
    pub fn status_count(&self) -> usize {
        self.status.calls()
    }

    /// Number of `batch_delete` calls so far.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.delete.calls()
    }

    /// Number of `submit_batch` calls so far.
    #[must_use]
    pub fn submit_count(&self) -> usize {
        self.submit.calls()
    }

    /// Number of `guest_preview` calls so far.
    #[must_use]
    pub fn preview_count(&self) -> usize {
        self.preview.calls()
    }

    /// Number of `lead_stats` calls so far.
    #[must_use]
    pub fn stats_count(&self) -> usize {
        self.stats.calls()
    }

    /// Batches received by `submit_batch`.
    #[must_use]
    pub fn submissions(&self) -> Vec<(TargetKind, Vec<ScrapeTarget>)> {
        lock(&self.submissions).clone()
    }

    /// Make the next `fetch_page` call fail.
    pub fn fail_next_fetch(&self, err: ApiError) {
        self.fetch.fail_next(err);
    }

    /// Make the next `fetch_page` call succeed (used to order scripted failures).
    pub fn succeed_next_fetch(&self) {
        self.fetch.succeed_next();
    }

    /// Hold the next `fetch_page` call until the gate is released.
    #[must_use]
    pub fn hold_next_fetch(&self) -> Gate {
        self.fetch.hold_next()
    }

    /// Make the next `update_status` call fail.
    pub fn fail_next_status(&self, err: ApiError) {
        self.status.fail_next(err);
    }

    /// Make the next `update_status` call succeed.
    pub fn succeed_next_status(&self) {
        self.status.succeed_next();
    }

    /// Hold the next `update_status` call until the gate is released.
    #[must_use]
    pub fn hold_next_status(&self) -> Gate {
        self.status.hold_next()
    }

    /// Make the next `batch_delete` call fail.
    pub fn fail_next_delete(&self, err: ApiError) {
        self.delete.fail_next(err);
    }

    /// Make the next `submit_batch` call fail.
    pub fn fail_next_submit(&self, err: ApiError) {
        self.submit.fail_next(err);
    }

    /// Make the next `guest_preview` call fail.
    pub fn fail_next_preview(&self, err: ApiError) {
        self.preview.fail_next(err);
    }

    /// Make the next `lead_stats` call fail.
    pub fn fail_next_stats(&self, err: ApiError) {
        self.stats.fail_next(err);
    }

    /// Make the next `lead_stats` call succeed.
    pub fn succeed_next_stats(&self) {
        self.stats.succeed_next();
    }

    /// Hold the next `lead_stats` call until the gate is released.
    #[must_use]
    pub fn hold_next_stats(&self) -> Gate {
        self.stats.hold_next()
    }

    /// Report the backend as healthy or not.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Delay health probe answers by `delay`.
    pub fn set_probe_delay(&self, delay: Option<Duration>) {
        *lock(&self.probe_delay) = delay;
    }
}

fn lead_matches(filter: &LeadFilter, lead: &Lead) -> bool {
    let contains = |field: Option<&String>, needle: &str| {
        needle.is_empty()
            || field.is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
    };
    filter.status.is_none_or(|status| lead.status == status)
        && filter.source.is_none_or(|source| lead.source == source)
        && contains(lead.city.as_ref(), &filter.city)
        && contains(lead.category.as_ref(), &filter.category)
        && filter.min_score.is_none_or(|min| lead.lead_score >= min)
        && (!filter.has_website || lead.website.is_some())
}

fn slice<T: Clone>(rows: &[T], offset: u64, limit: u32) -> PageSlice<T> {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(rows.len());
    let end = start.saturating_add(limit as usize).min(rows.len());
    PageSlice {
        items: rows[start..end].to_vec(),
        total: rows.len() as u64,
    }
}

#[async_trait]
impl PageSource for FakeLeadApi {
    type Item = Lead;
    type Filter = LeadFilter;

    async fn fetch_page(
        &self,
        filter: &LeadFilter,
        offset: u64,
        limit: u32,
    ) -> ApiResult<PageSlice<Lead>> {
        lock(&self.fetches).push(FetchCall {
            filter: filter.clone(),
            offset,
            limit,
        });
        if let Some(err) = self.fetch.enter().await {
            return Err(err);
        }
        let rows: Vec<Lead> = lock(&self.leads)
            .iter()
            .filter(|lead| lead_matches(filter, lead))
            .cloned()
            .collect();
        Ok(slice(&rows, offset, limit))
    }
}

#[async_trait]
impl BulkDelete for FakeLeadApi {
    async fn batch_delete(&self, ids: &[LeadId]) -> ApiResult<u64> {
        if let Some(err) = self.delete.enter().await {
            return Err(err);
        }
        let mut leads = lock(&self.leads);
        let before = leads.len();
        leads.retain(|lead| !ids.contains(&lead.id));
        Ok((before - leads.len()) as u64)
    }
}

#[async_trait]
impl LeadMutations for FakeLeadApi {
    async fn update_status(&self, id: LeadId, status: LeadStatus) -> ApiResult<Lead> {
        if let Some(err) = self.status.enter().await {
            return Err(err);
        }
        let mut leads = lock(&self.leads);
        let lead = leads
            .iter_mut()
            .find(|lead| lead.id == id)
            .ok_or_else(|| ApiError::Server {
                status: 404,
                detail: Some("Lead not found".to_string()),
            })?;
        lead.status = status;
        Ok(lead.clone())
    }
}

#[async_trait]
impl BatchSubmitter for FakeLeadApi {
    async fn submit_batch(
        &self,
        kind: TargetKind,
        targets: &[ScrapeTarget],
    ) -> ApiResult<ScrapeResponse> {
        if let Some(err) = self.submit.enter().await {
            return Err(err);
        }
        lock(&self.submissions).push((kind, targets.to_vec()));
        let job_id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        Ok(ScrapeResponse {
            job_id: i64::try_from(job_id).unwrap_or(i64::MAX),
            status: "pending".to_string(),
            message: format!("Queued {} target(s)", targets.len()),
        })
    }
}

fn count_where(leads: &[Lead], keep: impl Fn(&Lead) -> bool) -> u64 {
    leads.iter().filter(|lead| keep(lead)).count() as u64
}

#[async_trait]
impl StatsSource for FakeLeadApi {
    async fn lead_stats(&self) -> ApiResult<LeadStats> {
        if let Some(err) = self.stats.enter().await {
            return Err(err);
        }
        let leads = lock(&self.leads);
        let leads_by_status: BTreeMap<String, u64> = LeadStatus::ALL
            .into_iter()
            .map(|status| {
                let count = count_where(&leads, |lead| lead.status == status);
                (status.as_str().to_string(), count)
            })
            .collect();
        let leads_by_source: BTreeMap<String, u64> = [LeadSource::GoogleMaps, LeadSource::Instagram]
            .into_iter()
            .map(|source| {
                let count = count_where(&leads, |lead| lead.source == source);
                (source.as_str().to_string(), count)
            })
            .collect();
        Ok(LeadStats {
            total_leads: leads.len() as u64,
            high_priority_leads: count_where(&leads, |lead| lead.lead_score >= HIGH_PRIORITY_SCORE),
            leads_by_status,
            leads_by_source,
        })
    }
}

#[async_trait]
impl HealthProbe for FakeLeadApi {
    async fn probe_health(&self, timeout: Duration) -> bool {
        let delay = *lock(&self.probe_delay);
        if let Some(delay) = delay {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return false;
            }
            tokio::time::sleep(delay).await;
        }
        self.healthy.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewSource for FakeLeadApi {
    async fn guest_preview(
        &self,
        request: &GuestPreviewRequest,
    ) -> ApiResult<GuestPreviewResponse> {
        if let Some(err) = self.preview.enter().await {
            return Err(err);
        }
        let leads = demo_leads(request);
        let used = u32::try_from(leads.len()).unwrap_or(u32::MAX);
        Ok(GuestPreviewResponse {
            status: "completed".to_string(),
            leads,
            data_source: "apify_live".to_string(),
            execution_mode: Some("live".to_string()),
            fallback_reason: None,
            usage: Some(GuestUsage {
                jobs_used: 1,
                leads_used: used,
            }),
        })
    }
}

/// In-memory jobs backend.
#[derive(Debug, Default)]
pub struct FakeJobApi {
    jobs: Mutex<Vec<JobSummary>>,
    fetch: Script,
}

impl FakeJobApi {
    /// Backend holding `jobs`.
    #[must_use]
    pub fn new(jobs: Vec<JobSummary>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            fetch: Script::default(),
        }
    }

    /// Replace server-side jobs.
    pub fn set_jobs(&self, jobs: Vec<JobSummary>) {
        *lock(&self.jobs) = jobs;
    }

    /// Number of `fetch_page` calls so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch.calls()
    }

    /// Hold the next `fetch_page` call until the gate is released.
    #[must_use]
    pub fn hold_next_fetch(&self) -> Gate {
        self.fetch.hold_next()
    }

    /// Make the next `fetch_page` call fail.
    pub fn fail_next_fetch(&self, err: ApiError) {
        self.fetch.fail_next(err);
    }
}

#[async_trait]
impl JobLookup for FakeJobApi {
    async fn job(&self, id: JobId) -> ApiResult<JobSummary> {
        lock(&self.jobs)
            .iter()
            .find(|job| job.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Server {
                status: 404,
                detail: Some("Job not found".to_string()),
            })
    }
}

#[async_trait]
impl PageSource for FakeJobApi {
    type Item = JobSummary;
    type Filter = JobFilter;

    async fn fetch_page(
        &self,
        filter: &JobFilter,
        offset: u64,
        limit: u32,
    ) -> ApiResult<PageSlice<JobSummary>> {
        if let Some(err) = self.fetch.enter().await {
            return Err(err);
        }
        let rows: Vec<JobSummary> = lock(&self.jobs)
            .iter()
            .filter(|job| filter.status.is_none_or(|status| job.status == status))
            .cloned()
            .collect();
        Ok(slice(&rows, offset, limit))
    }
}
