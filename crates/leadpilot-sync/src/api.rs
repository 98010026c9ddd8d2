//! Remote collaborators the sync components call into.
//!
//! # Design
//! - One narrow trait per concern so fakes only implement what a test needs.
//! - Errors are always [`ApiError`]; components decide the local reaction.

use std::time::Duration;

use async_trait::async_trait;
use leadpilot_api_models::{
    GuestPreviewRequest, GuestPreviewResponse, JobId, JobSummary, Lead, LeadId, LeadStats,
    LeadStatus, PageSlice, ScrapeResponse, ScrapeTarget, TargetKind,
};

use crate::entity::Entity;
use crate::error::ApiResult;

/// Paginated list endpoint.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Row type returned by the endpoint.
    type Item: Entity;
    /// Filter predicates accepted by the endpoint.
    type Filter: Clone + PartialEq + Send + Sync + 'static;

    /// Fetch `limit` rows starting at `offset` for `filter`.
    async fn fetch_page(
        &self,
        filter: &Self::Filter,
        offset: u64,
        limit: u32,
    ) -> ApiResult<PageSlice<Self::Item>>;
}

/// Bulk removal for a list endpoint.
#[async_trait]
pub trait BulkDelete: PageSource {
    /// Delete every id in `ids`; succeeds only if all were removed.
    async fn batch_delete(&self, ids: &[<Self::Item as Entity>::Id]) -> ApiResult<u64>;
}

/// Single-field lead updates.
#[async_trait]
pub trait LeadMutations: Send + Sync {
    /// Persist a new pipeline status for a lead.
    async fn update_status(&self, id: LeadId, status: LeadStatus) -> ApiResult<Lead>;
}

/// Dashboard counters.
#[async_trait]
pub trait StatsSource: Send + Sync + 'static {
    /// Fetch lead totals per status and source.
    async fn lead_stats(&self) -> ApiResult<LeadStats>;
}

/// Single-job lookup.
#[async_trait]
pub trait JobLookup: Send + Sync {
    /// Fetch one job by id.
    async fn job(&self, id: JobId) -> ApiResult<JobSummary>;
}

/// Batch scrape submission.
#[async_trait]
pub trait BatchSubmitter: Send + Sync {
    /// Queue one job covering every target of `kind`.
    async fn submit_batch(
        &self,
        kind: TargetKind,
        targets: &[ScrapeTarget],
    ) -> ApiResult<ScrapeResponse>;
}

/// Lightweight reachability check.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns `true` when the backend answered healthy within `timeout`.
    async fn probe_health(&self, timeout: Duration) -> bool;
}

/// Guest preview endpoint.
#[async_trait]
pub trait PreviewSource: HealthProbe {
    /// Run a small live preview.
    async fn guest_preview(&self, request: &GuestPreviewRequest)
    -> ApiResult<GuestPreviewResponse>;
}
