//! Baseline values used when neither the config file nor the environment
//! provides a setting.
//!
//! # Design
//! - Keep every tunable in one place so docs and tests agree.
//! - Time-based defaults are expressed in milliseconds or seconds as stored.

/// Base URL of a locally running LeadPilot API.
pub const API_BASE_URL: &str = "http://localhost:8000";
/// Timeout applied to regular API calls.
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Timeout applied to the health probe before falling back.
pub const PROBE_TIMEOUT_MS: u64 = 1_500;

/// Quiet period before a filter edit becomes effective.
pub const DEBOUNCE_MS: u64 = 280;
/// Background refresh cadence.
pub const POLL_INTERVAL_MS: u64 = 5_000;
/// Rows requested per page.
pub const PAGE_SIZE: u32 = 50;
/// Lifetime of a user notice before it expires.
pub const NOTICE_TTL_MS: u64 = 4_000;
/// Age after which the leads view is considered stale.
pub const LEADS_STALE_AFTER_SECS: u64 = 60;
/// Age after which the jobs view is considered stale.
pub const JOBS_STALE_AFTER_SECS: u64 = 30;

/// Limit used when a target omits one or supplies a non-integer.
pub const TARGET_DEFAULT_LIMIT: u32 = 50;
/// Smallest accepted per-target limit.
pub const TARGET_MIN_LIMIT: u32 = 1;
/// Largest accepted per-target limit.
pub const TARGET_MAX_LIMIT: u32 = 200;
/// Upper bound for Instagram follower filters.
pub const FOLLOWERS_CEILING: u64 = 10_000_000;
/// Upper bound for Instagram score thresholds.
pub const SCORE_CEILING: u8 = 100;
/// Maximum Google Maps targets per batch job.
pub const MAPS_BATCH_CAP: usize = 50;
/// Maximum Instagram keywords per batch job.
pub const INSTAGRAM_BATCH_CAP: usize = 30;
/// Field delimiters recognised by bulk paste.
pub const BULK_DELIMITERS: &str = ",|";
