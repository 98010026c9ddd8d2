//! Typed configuration sections.
//!
//! # Design
//! - Plain data carriers; every section deserializes from a partial document
//!   with missing keys falling back to [`crate::defaults`].
//! - Duration accessors keep millisecond storage out of call sites.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration consumed by the client, sync layer, and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// HTTP endpoint settings.
    pub api: ApiConfig,
    /// Timers and paging for the sync components.
    pub sync: SyncConfig,
    /// Target normalization bounds and batch caps.
    pub targets: TargetConfig,
}

/// HTTP endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the LeadPilot API.
    pub base_url: String,
    /// Optional key forwarded as `X-API-Key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Timeout for regular API calls.
    pub request_timeout_ms: u64,
    /// Timeout for health probes.
    pub probe_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_BASE_URL.to_string(),
            api_key: None,
            request_timeout_ms: defaults::REQUEST_TIMEOUT_MS,
            probe_timeout_ms: defaults::PROBE_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    /// Timeout for regular API calls.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Timeout for health probes.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Timers and paging for the sync components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Filter debounce quiet period.
    pub debounce_ms: u64,
    /// Polling cadence.
    pub poll_interval_ms: u64,
    /// Rows per page.
    pub page_size: u32,
    /// Notice lifetime.
    pub notice_ttl_ms: u64,
    /// Staleness threshold for the leads view.
    pub leads_stale_after_secs: u64,
    /// Staleness threshold for the jobs view.
    pub jobs_stale_after_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::DEBOUNCE_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            page_size: defaults::PAGE_SIZE,
            notice_ttl_ms: defaults::NOTICE_TTL_MS,
            leads_stale_after_secs: defaults::LEADS_STALE_AFTER_SECS,
            jobs_stale_after_secs: defaults::JOBS_STALE_AFTER_SECS,
        }
    }
}

impl SyncConfig {
    /// Filter debounce quiet period.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Polling cadence.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Notice lifetime.
    #[must_use]
    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    /// Staleness threshold for the leads view.
    #[must_use]
    pub const fn leads_stale_after(&self) -> Duration {
        Duration::from_secs(self.leads_stale_after_secs)
    }

    /// Staleness threshold for the jobs view.
    #[must_use]
    pub const fn jobs_stale_after(&self) -> Duration {
        Duration::from_secs(self.jobs_stale_after_secs)
    }
}

/// Target normalization bounds and batch caps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    /// Limit applied when a target omits one.
    pub default_limit: u32,
    /// Lower clamp for limits.
    pub min_limit: u32,
    /// Upper clamp for limits.
    pub max_limit: u32,
    /// Upper clamp for follower bounds.
    pub followers_ceiling: u64,
    /// Upper clamp for score thresholds.
    pub score_ceiling: u8,
    /// Google Maps targets accepted per batch.
    pub maps_batch_cap: usize,
    /// Instagram keywords accepted per batch.
    pub instagram_batch_cap: usize,
    /// Characters that split bulk-paste lines into fields.
    pub delimiters: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            default_limit: defaults::TARGET_DEFAULT_LIMIT,
            min_limit: defaults::TARGET_MIN_LIMIT,
            max_limit: defaults::TARGET_MAX_LIMIT,
            followers_ceiling: defaults::FOLLOWERS_CEILING,
            score_ceiling: defaults::SCORE_CEILING,
            maps_batch_cap: defaults::MAPS_BATCH_CAP,
            instagram_batch_cap: defaults::INSTAGRAM_BATCH_CAP,
            delimiters: defaults::BULK_DELIMITERS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() -> Result<(), serde_json::Error> {
        let config: ClientConfig =
            serde_json::from_str(r#"{"sync": {"page_size": 25}, "api": {"api_key": "k"}}"#)?;
        assert_eq!(config.sync.page_size, 25);
        assert_eq!(config.sync.debounce(), Duration::from_millis(280));
        assert_eq!(config.api.api_key.as_deref(), Some("k"));
        assert_eq!(config.api.base_url, defaults::API_BASE_URL);
        assert_eq!(config.targets, TargetConfig::default());
        Ok(())
    }

    #[test]
    fn duration_accessors_match_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.probe_timeout(), Duration::from_millis(1_500));
        assert_eq!(config.api.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.sync.notice_ttl(), Duration::from_secs(4));
        assert_eq!(config.sync.leads_stale_after(), Duration::from_secs(60));
        assert_eq!(config.sync.jobs_stale_after(), Duration::from_secs(30));
    }
}
