//! Guest preview with a clearly labelled offline fallback.
//!
//! # Design
//! - A short health probe runs first; an unreachable backend goes straight to
//!   locally generated demo rows instead of waiting out the request timeout.
//! - Connectivity failures on the preview call itself also fall back.
//! - Server-reported failures (quota, validation) surface as errors; showing
//!   demo rows there would hide an actionable message.

use std::sync::Arc;

use leadpilot_api_models::{GuestPreviewRequest, GuestUsage, PreviewLead};
use tracing::{info, instrument, warn};

use crate::api::PreviewSource;
use crate::context::SyncContext;
use crate::error::ApiResult;

const DEMO_SOURCE: &str = "local_demo";
const DEMO_PREFIXES: [&str; 6] = ["Prime", "Urban", "Summit", "Northside", "Bright", "Elite"];
const MAX_DEMO_ROWS: u32 = 10;

/// Preview rows plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOutcome {
    /// Rows to display.
    pub leads: Vec<PreviewLead>,
    /// `true` only when the rows came from a live backend run.
    pub live: bool,
    /// Backend or local data source label.
    pub data_source: String,
    /// Why the rows are not live, when they are not.
    pub fallback_reason: Option<String>,
    /// Guest quota usage reported by the backend.
    pub usage: Option<GuestUsage>,
}

/// Runs guest previews against a backend with fallback.
#[derive(Debug)]
pub struct GuestPreview<A: ?Sized> {
    api: Arc<A>,
    ctx: SyncContext,
}

impl<A: PreviewSource + ?Sized> GuestPreview<A> {
    /// Create a runner over `api`.
    #[must_use]
    pub fn new(api: Arc<A>, ctx: SyncContext) -> Self {
        Self { api, ctx }
    }

    /// Run one preview.
    ///
    /// # Errors
    ///
    /// Returns the server failure when the backend is reachable but rejects
    /// the preview. Connectivity failures never error; they fall back.
    #[instrument(name = "preview.run", skip(self), fields(city = %request.city, category = %request.category))]
    pub async fn run(&self, request: GuestPreviewRequest) -> ApiResult<PreviewOutcome> {
        let probe_timeout = self.ctx.config.api.probe_timeout();
        if !self.api.probe_health(probe_timeout).await {
            return Ok(self.fall_back(&request, "backend unreachable"));
        }
        match self.api.guest_preview(&request).await {
            Ok(response) => {
                let live = response.is_live();
                info!(live, rows = response.leads.len(), source = %response.data_source, "preview completed");
                if !live {
                    self.ctx
                        .notices
                        .info("Showing sample data; live results were unavailable");
                }
                Ok(PreviewOutcome {
                    live,
                    leads: response.leads,
                    data_source: response.data_source,
                    fallback_reason: response.fallback_reason,
                    usage: response.usage,
                })
            }
            Err(err) if err.is_connectivity() => {
                warn!(error = %err, "preview call failed; using local demo rows");
                Ok(self.fall_back(&request, &err.describe()))
            }
            Err(err) => {
                warn!(error = %err, "preview rejected");
                self.ctx
                    .notices
                    .error(format!("Preview failed: {}", err.describe()));
                Err(err)
            }
        }
    }

    fn fall_back(&self, request: &GuestPreviewRequest, reason: &str) -> PreviewOutcome {
        self.ctx
            .notices
            .info(format!("Offline preview: {reason}. Showing demo data"));
        PreviewOutcome {
            leads: demo_leads(request),
            live: false,
            data_source: DEMO_SOURCE.to_string(),
            fallback_reason: Some(reason.to_string()),
            usage: None,
        }
    }
}

/// Deterministic demo rows for `request`.
#[must_use]
pub fn demo_leads(request: &GuestPreviewRequest) -> Vec<PreviewLead> {
    let city = request.city.trim();
    let category = request.category.trim();
    (0..request.limit.clamp(1, MAX_DEMO_ROWS))
        .map(|index| {
            let prefix = DEMO_PREFIXES[index as usize % DEMO_PREFIXES.len()];
            let has_site = index % 3 == 2;
            let step = u8::try_from(index).unwrap_or(u8::MAX);
            PreviewLead {
                name: format!("{prefix} {category} {}", index + 1),
                city: Some(city.to_string()),
                category: Some(category.to_string()),
                rating: Some(4.8 - f32::from(step) * 0.1),
                reviews: Some(40 + index * 17),
                website: has_site.then(|| "https://example.com".to_string()),
                lead_score: 88_u8.saturating_sub(step.saturating_mul(4)),
                reason: Some(if has_site {
                    "Sample: site lacks booking flow".to_string()
                } else {
                    "Sample: no website listed".to_string()
                }),
            }
        })
        .collect()
}
