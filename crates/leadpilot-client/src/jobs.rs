//! Jobs endpoints.

use async_trait::async_trait;
use leadpilot_api_models::{JobFilter, JobId, JobSummary, PageSlice};
use leadpilot_sync::{ApiResult, JobLookup, PageSource};

use crate::transport::ApiClient;

/// `reqwest`-backed jobs API.
#[derive(Debug, Clone)]
pub struct HttpJobApi {
    client: ApiClient,
}

impl HttpJobApi {
    /// Wrap a configured client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpJobApi {
    type Item = JobSummary;
    type Filter = JobFilter;

    async fn fetch_page(
        &self,
        filter: &JobFilter,
        offset: u64,
        limit: u32,
    ) -> ApiResult<PageSlice<JobSummary>> {
        let url = self.client.url("/api/jobs")?;
        let mut query = vec![("skip", offset.to_string()), ("limit", limit.to_string())];
        if let Some(status) = filter.status {
            query.push(("status", status.as_str().to_string()));
        }
        let request = self.client.get(url).query(&query);
        self.client.send_json(request, "fetch_jobs").await
    }
}

#[async_trait]
impl JobLookup for HttpJobApi {
    async fn job(&self, id: JobId) -> ApiResult<JobSummary> {
        let url = self.client.url(&format!("/api/jobs/{id}"))?;
        self.client.send_json(self.client.get(url), "fetch_job").await
    }
}
