//! Leads, scrape and preview endpoints.

use std::time::Duration;

use async_trait::async_trait;
use leadpilot_api_models::{
    BatchDeleteRequest, BatchDeleteResponse, BatchScrapeRequest, GoogleMapsTarget,
    GuestPreviewRequest, GuestPreviewResponse, InstagramTarget, Lead, LeadFilter, LeadId,
    LeadStats, LeadStatus, LeadStatusUpdate, PageSlice, ScrapeResponse, ScrapeTarget, TargetKind,
};
use leadpilot_sync::{
    ApiResult, BatchSubmitter, BulkDelete, HealthProbe, LeadMutations, PageSource, PreviewSource,
    StatsSource,
};
use tracing::{debug, instrument};

use crate::transport::ApiClient;

/// `reqwest`-backed leads API.
#[derive(Debug, Clone)]
pub struct HttpLeadApi {
    client: ApiClient,
}

impl HttpLeadApi {
    /// Wrap a configured client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn lead_query(filter: &LeadFilter, offset: u64, limit: u32) -> Vec<(&'static str, String)> {
    let mut query = vec![("skip", offset.to_string()), ("limit", limit.to_string())];
    if let Some(status) = filter.status {
        query.push(("status", status.as_str().to_string()));
    }
    if let Some(source) = filter.source {
        query.push(("source", source.as_str().to_string()));
    }
    let city = filter.city.trim();
    if !city.is_empty() {
        query.push(("city", city.to_string()));
    }
    let category = filter.category.trim();
    if !category.is_empty() {
        query.push(("category", category.to_string()));
    }
    if let Some(min_score) = filter.min_score {
        query.push(("min_score", min_score.to_string()));
    }
    if filter.has_website {
        query.push(("has_website", "true".to_string()));
    }
    query
}

#[async_trait]
impl PageSource for HttpLeadApi {
    type Item = Lead;
    type Filter = LeadFilter;

    #[instrument(name = "http.leads.fetch_page", skip(self, filter))]
    async fn fetch_page(
        &self,
        filter: &LeadFilter,
        offset: u64,
        limit: u32,
    ) -> ApiResult<PageSlice<Lead>> {
        let url = self.client.url("/api/leads")?;
        let request = self.client.get(url).query(&lead_query(filter, offset, limit));
        self.client.send_json(request, "fetch_page").await
    }
}

#[async_trait]
impl BulkDelete for HttpLeadApi {
    async fn batch_delete(&self, ids: &[LeadId]) -> ApiResult<u64> {
        let url = self.client.url("/api/leads/batch-delete")?;
        let body = BatchDeleteRequest { ids: ids.to_vec() };
        let response: BatchDeleteResponse = self
            .client
            .send_json(self.client.post(url).json(&body), "batch_delete")
            .await?;
        debug!(deleted = response.deleted, "batch delete acknowledged");
        Ok(response.deleted)
    }
}

#[async_trait]
impl LeadMutations for HttpLeadApi {
    async fn update_status(&self, id: LeadId, status: LeadStatus) -> ApiResult<Lead> {
        let url = self.client.url(&format!("/api/leads/{id}/status"))?;
        let request = self.client.patch(url).json(&LeadStatusUpdate { status });
        self.client.send_json(request, "update_status").await
    }
}

#[async_trait]
impl StatsSource for HttpLeadApi {
    #[instrument(name = "http.leads.stats", skip(self))]
    async fn lead_stats(&self) -> ApiResult<LeadStats> {
        let url = self.client.url("/api/leads/stats")?;
        self.client.send_json(self.client.get(url), "lead_stats").await
    }
}

#[async_trait]
impl BatchSubmitter for HttpLeadApi {
    #[instrument(name = "http.scrape.submit", skip(self, targets), fields(count = targets.len()))]
    async fn submit_batch(
        &self,
        kind: TargetKind,
        targets: &[ScrapeTarget],
    ) -> ApiResult<ScrapeResponse> {
        let request = match kind {
            TargetKind::GoogleMaps => {
                let body = BatchScrapeRequest::<GoogleMapsTarget> {
                    targets: targets
                        .iter()
                        .filter_map(|target| match target {
                            ScrapeTarget::GoogleMaps(maps) => Some(maps.clone()),
                            ScrapeTarget::Instagram(_) => None,
                        })
                        .collect(),
                };
                self.client
                    .post(self.client.url("/api/scrape/google-maps")?)
                    .json(&body)
            }
            TargetKind::Instagram => {
                let body = BatchScrapeRequest::<InstagramTarget> {
                    targets: targets
                        .iter()
                        .filter_map(|target| match target {
                            ScrapeTarget::Instagram(instagram) => Some(instagram.clone()),
                            ScrapeTarget::GoogleMaps(_) => None,
                        })
                        .collect(),
                };
                self.client
                    .post(self.client.url("/api/scrape/instagram")?)
                    .json(&body)
            }
        };
        self.client.send_json(request, "submit_batch").await
    }
}

#[async_trait]
impl HealthProbe for HttpLeadApi {
    async fn probe_health(&self, timeout: Duration) -> bool {
        self.client.probe(timeout).await
    }
}

#[async_trait]
impl PreviewSource for HttpLeadApi {
    async fn guest_preview(
        &self,
        request: &GuestPreviewRequest,
    ) -> ApiResult<GuestPreviewResponse> {
        let url = self.client.url("/api/scrape/guest-preview")?;
        self.client
            .send_json(self.client.post(url).json(request), "guest_preview")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_omits_unset_predicates() {
        let query = lead_query(&LeadFilter::default(), 50, 50);
        assert_eq!(
            query,
            [("skip", "50".to_string()), ("limit", "50".to_string())]
        );
    }

    #[test]
    fn query_carries_every_set_predicate() {
        let filter = LeadFilter {
            status: Some(LeadStatus::NotInterested),
            source: Some(leadpilot_api_models::LeadSource::Instagram),
            city: " Austin ".into(),
            category: "Dentist".into(),
            min_score: Some(70),
            has_website: true,
        };
        let keys: Vec<&str> = lead_query(&filter, 0, 25).iter().map(|(key, _)| *key).collect();
        assert_eq!(
            keys,
            ["skip", "limit", "status", "source", "city", "category", "min_score", "has_website"]
        );
        let query = lead_query(&filter, 0, 25);
        assert!(query.contains(&("status", "not_interested".to_string())));
        assert!(query.contains(&("city", "Austin".to_string())));
    }
}
