#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the LeadPilot public API.
//!
//! These types are used by the HTTP client for request/response encoding and
//! by the sync layer as its entity model, so the wire contract stays a single
//! source of truth.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a lead by the backend.
pub type LeadId = i64;

/// Identifier assigned to a scrape job by the backend.
pub type JobId = i64;

/// RFC9457-compatible problem document surfaced on validation/runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Detailed diagnostic message when available.
    pub detail: Option<String>,
}

/// Error body emitted by the API framework (`{"detail": ...}`).
///
/// `detail` is usually a string but validation failures carry a list of
/// field errors, so it is kept as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Detail payload (string or structured list).
    pub detail: serde_json::Value,
}

impl ErrorResponse {
    /// Flatten the detail payload into a single human-readable line.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

/// Pipeline status of a lead as tracked by the sales team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Freshly scraped, untouched.
    #[default]
    New,
    /// First outreach sent.
    Contacted,
    /// Lead answered.
    Replied,
    /// Meeting booked.
    Meeting,
    /// Deal closed.
    Closed,
    /// Lead declined.
    NotInterested,
}

impl LeadStatus {
    /// Every status in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::New,
        Self::Contacted,
        Self::Replied,
        Self::Meeting,
        Self::Closed,
        Self::NotInterested,
    ];

    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Replied => "replied",
            Self::Meeting => "meeting",
            Self::Closed => "closed",
            Self::NotInterested => "not_interested",
        }
    }
}

impl Display for LeadStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| UnknownVariant {
                kind: "lead status",
                value: value.to_string(),
            })
    }
}

/// Where a lead was scraped from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    /// Google Maps business listings.
    #[default]
    GoogleMaps,
    /// Instagram profiles.
    Instagram,
}

impl LeadSource {
    /// Wire representation of the source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GoogleMaps => "google_maps",
            Self::Instagram => "instagram",
        }
    }
}

impl Display for LeadSource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google_maps" | "google-maps" | "maps" => Ok(Self::GoogleMaps),
            "instagram" | "ig" => Ok(Self::Instagram),
            _ => Err(UnknownVariant {
                kind: "lead source",
                value: value.to_string(),
            }),
        }
    }
}

/// Lifecycle of a queued scrape job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker.
    Pending,
    /// Picked up by a worker.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the job still occupies a worker slot.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl Display for JobStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(UnknownVariant {
                kind: "job status",
                value: value.to_string(),
            }),
        }
    }
}

/// Parse failure for the string-backed enums above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Enum being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl Display for UnknownVariant {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Lead record as returned by `GET /api/leads`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    /// Backend identifier.
    pub id: LeadId,
    /// Business or profile name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Contact phone number.
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// City the business operates in.
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Business category.
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Average rating (0–5).
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Number of reviews.
    pub reviews: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Website URL.
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Instagram handle or URL.
    pub instagram: Option<String>,
    #[serde(default)]
    /// Score in the range 0–100.
    pub lead_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Why the lead was scored this way.
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Generated outreach draft.
    pub ai_outreach: Option<String>,
    #[serde(default)]
    /// Source the lead was scraped from.
    pub source: LeadSource,
    #[serde(default)]
    /// Sales pipeline status.
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Country, when known.
    pub country: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Scrape job as returned by `GET /api/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSummary {
    /// Backend identifier.
    pub id: JobId,
    /// Job type (`google_maps` or `instagram`).
    pub job_type: String,
    /// JSON-encoded target list as stored by the backend.
    pub targets: String,
    /// Current job status.
    pub status: JobStatus,
    #[serde(default)]
    /// Leads found so far.
    pub leads_found: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Failure message for failed jobs.
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// When a worker picked the job up.
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// When the job finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageSlice<T> {
    /// Items on the requested page.
    pub items: Vec<T>,
    /// Total number of items matching the filter server-side.
    pub total: u64,
}

impl<T> PageSlice<T> {
    /// An empty page with a zero total.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Predicates accepted by the leads list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LeadFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Exact status match.
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Exact source match.
    pub source: Option<LeadSource>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    /// Free-text city match (server-side substring).
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    /// Free-text category match (server-side substring).
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Minimum lead score.
    pub min_score: Option<u8>,
    #[serde(default)]
    /// Only leads that have a website.
    pub has_website: bool,
}

/// Predicates accepted by the jobs list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JobFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Exact status match.
    pub status: Option<JobStatus>,
}

/// Body of `PATCH /api/leads/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadStatusUpdate {
    /// Requested status.
    pub status: LeadStatus,
}

/// Body of `POST /api/leads/batch-delete`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDeleteRequest {
    /// Leads to delete.
    pub ids: Vec<LeadId>,
}

/// Acknowledgement returned by `POST /api/leads/batch-delete`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BatchDeleteResponse {
    #[serde(default)]
    /// Number of rows removed server-side.
    pub deleted: u64,
}

/// Lead score at or above which the dashboard counts a lead as high priority.
pub const HIGH_PRIORITY_SCORE: u8 = 80;

/// Dashboard counters returned by `GET /api/leads/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LeadStats {
    /// Every stored lead.
    pub total_leads: u64,
    /// Leads scoring at least [`HIGH_PRIORITY_SCORE`].
    pub high_priority_leads: u64,
    #[serde(default)]
    /// Lead count per pipeline status, keyed by wire name.
    pub leads_by_status: BTreeMap<String, u64>,
    #[serde(default)]
    /// Lead count per source, keyed by wire name.
    pub leads_by_source: BTreeMap<String, u64>,
}

impl LeadStats {
    /// Leads in `status`; statuses the backend left out count as zero.
    #[must_use]
    pub fn status_count(&self, status: LeadStatus) -> u64 {
        self.leads_by_status
            .get(status.as_str())
            .copied()
            .unwrap_or_default()
    }

    /// Leads scraped from `source`; sources the backend left out count as zero.
    #[must_use]
    pub fn source_count(&self, source: LeadSource) -> u64 {
        self.leads_by_source
            .get(source.as_str())
            .copied()
            .unwrap_or_default()
    }
}

/// Which scraper a target belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// City + category searches on Google Maps.
    GoogleMaps,
    /// Keyword searches on Instagram.
    Instagram,
}

impl TargetKind {
    /// Wire representation of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GoogleMaps => "google_maps",
            Self::Instagram => "instagram",
        }
    }
}

impl Display for TargetKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad(self.as_str())
    }
}

/// Normalized Google Maps scrape target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleMapsTarget {
    /// City to search in.
    pub city: String,
    /// Business category to search for.
    pub category: String,
    /// Maximum leads to collect.
    pub limit: u32,
}

/// Normalized Instagram scrape target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstagramTarget {
    /// Search keyword.
    pub keyword: String,
    /// Maximum profiles to collect.
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Lower follower bound.
    pub followers_min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Upper follower bound.
    pub followers_max: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Minimum lead score to keep.
    pub score_threshold: Option<u8>,
}

/// A normalized target of either kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrapeTarget {
    /// Google Maps target.
    GoogleMaps(GoogleMapsTarget),
    /// Instagram target.
    Instagram(InstagramTarget),
}

impl ScrapeTarget {
    /// Which scraper this target is for.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::GoogleMaps(_) => TargetKind::GoogleMaps,
            Self::Instagram(_) => TargetKind::Instagram,
        }
    }

    /// Lead budget requested by this target.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        match self {
            Self::GoogleMaps(target) => target.limit,
            Self::Instagram(target) => target.limit,
        }
    }
}

/// Body of `POST /api/scrape/google-maps` and `POST /api/scrape/instagram`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchScrapeRequest<T> {
    /// Targets to queue in one job.
    pub targets: Vec<T>,
}

/// Response of the scrape endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapeResponse {
    /// Identifier of the queued job.
    pub job_id: JobId,
    /// Initial job status.
    pub status: String,
    #[serde(default)]
    /// Human-readable confirmation.
    pub message: String,
}

/// Body of `POST /api/scrape/guest-preview`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestPreviewRequest {
    /// City to preview.
    pub city: String,
    /// Category to preview.
    pub category: String,
    /// Number of preview leads requested.
    pub limit: u32,
}

/// Lead row returned by the guest preview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewLead {
    /// Business name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// City.
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Category.
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Average rating.
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Review count.
    pub reviews: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Website URL.
    pub website: Option<String>,
    #[serde(default)]
    /// Score in the range 0–100.
    pub lead_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Scoring rationale.
    pub reason: Option<String>,
}

/// Guest quota usage reported alongside a preview.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GuestUsage {
    /// Preview jobs consumed this month.
    pub jobs_used: u32,
    /// Preview leads consumed this month.
    pub leads_used: u32,
}

/// Response of `POST /api/scrape/guest-preview`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestPreviewResponse {
    /// Preview status (`completed` on success).
    pub status: String,
    /// Preview leads.
    #[serde(default)]
    pub leads: Vec<PreviewLead>,
    /// Backend data source label (`apify_live`, `cache_live`, `demo`, ...).
    #[serde(default)]
    pub data_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Backend execution mode (`live` or `demo`).
    pub execution_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Backend-side fallback reason, when the backend itself degraded.
    pub fallback_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Quota usage after this preview.
    pub usage: Option<GuestUsage>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `healthy` when the API is serving.
    pub status: String,
}

impl GuestPreviewResponse {
    /// Whether the backend served live data rather than its own demo set.
    #[must_use]
    pub fn is_live(&self) -> bool {
        let live_mode = self
            .execution_mode
            .as_deref()
            .is_none_or(|mode| mode.eq_ignore_ascii_case("live"));
        live_mode && self.data_source != "demo" && self.fallback_reason.is_none()
    }
}

impl HealthResponse {
    /// Whether the backend reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
