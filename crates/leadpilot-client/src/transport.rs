//! Shared HTTP plumbing.
//!
//! # Design
//! - One `reqwest::Client` per configuration, cheap to clone into resource
//!   handles.
//! - The API key rides as a default header; every request gets a fresh
//!   `x-request-id` so server logs can be correlated with client traces.

use std::time::Duration;

use leadpilot_config::ApiConfig;
use leadpilot_sync::{ApiError, ApiResult};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ClientError;
use crate::jobs::HttpJobApi;
use crate::leads::HttpLeadApi;
use crate::problem;

/// Header carrying the configured API key.
pub const HEADER_API_KEY: &str = "X-API-Key";
/// Header carrying a per-request correlation id.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Configured connection to one LeadPilot backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the base URL or API key is malformed, or
    /// when `reqwest` rejects the configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = config
            .base_url
            .parse::<Url>()
            .map_err(|source| ClientError::InvalidBaseUrl {
                value: config.base_url.clone(),
                source,
            })?;

        let mut default_headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty()) {
            let value = HeaderValue::from_str(key).map_err(|_| ClientError::InvalidApiKey)?;
            default_headers.insert(HEADER_API_KEY, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(default_headers)
            .build()
            .map_err(|source| ClientError::Build { source })?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Leads resource handle.
    #[must_use]
    pub fn leads(&self) -> HttpLeadApi {
        HttpLeadApi::new(self.clone())
    }

    /// Jobs resource handle.
    #[must_use]
    pub fn jobs(&self) -> HttpJobApi {
        HttpJobApi::new(self.clone())
    }

    pub(crate) fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url.join(path).map_err(|err| ApiError::Transport {
            detail: format!("invalid request path '{path}': {err}"),
        })
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        tagged(self.client.get(url))
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        tagged(self.client.post(url))
    }

    pub(crate) fn patch(&self, url: Url) -> RequestBuilder {
        tagged(self.client.patch(url))
    }

    /// Send `request` and decode a JSON success body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> ApiResult<T> {
        let response = request
            .send()
            .await
            .map_err(|err| problem::from_transport(&err, operation))?;
        if !response.status().is_success() {
            return Err(problem::classify(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|err| problem::from_transport(&err, operation))
    }

    /// `GET /api/health` bounded by `timeout`; any failure counts as unreachable.
    pub(crate) async fn probe(&self, timeout: Duration) -> bool {
        let Ok(url) = self.url("/api/health") else {
            return false;
        };
        let request = self.get(url).timeout(timeout).send();
        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => response
                .json::<leadpilot_api_models::HealthResponse>()
                .await
                .is_ok_and(|health| health.is_healthy()),
            Ok(Ok(response)) => {
                tracing::debug!(status = %response.status(), "health probe rejected");
                false
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "health probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(?timeout, "health probe timed out");
                false
            }
        }
    }
}

fn tagged(request: RequestBuilder) -> RequestBuilder {
    request.header(HEADER_REQUEST_ID, Uuid::new_v4().to_string())
}
