//! Range and shape checks applied after all overlays are merged.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ApiConfig, ClientConfig, SyncConfig, TargetConfig};

/// Largest page size the list endpoints accept.
const MAX_PAGE_SIZE: u32 = 200;

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first offending field.
pub fn validate(config: &ClientConfig) -> ConfigResult<()> {
    validate_api(&config.api)?;
    validate_sync(&config.sync)?;
    validate_targets(&config.targets)
}

fn validate_api(api: &ApiConfig) -> ConfigResult<()> {
    let url = Url::parse(&api.base_url)
        .map_err(|_| ConfigError::invalid("api", "base_url", &api.base_url, "not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "api",
            "base_url",
            &api.base_url,
            "scheme must be http or https",
        ));
    }
    if api.request_timeout_ms == 0 {
        return Err(ConfigError::invalid(
            "api",
            "request_timeout_ms",
            api.request_timeout_ms,
            "must be greater than zero",
        ));
    }
    if api.probe_timeout_ms == 0 || api.probe_timeout_ms > api.request_timeout_ms {
        return Err(ConfigError::invalid(
            "api",
            "probe_timeout_ms",
            api.probe_timeout_ms,
            "must be non-zero and no longer than the request timeout",
        ));
    }
    Ok(())
}

fn validate_sync(sync: &SyncConfig) -> ConfigResult<()> {
    if sync.poll_interval_ms == 0 {
        return Err(ConfigError::invalid(
            "sync",
            "poll_interval_ms",
            sync.poll_interval_ms,
            "must be greater than zero",
        ));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&sync.page_size) {
        return Err(ConfigError::invalid(
            "sync",
            "page_size",
            sync.page_size,
            "must be between 1 and 200",
        ));
    }
    if sync.notice_ttl_ms == 0 {
        return Err(ConfigError::invalid(
            "sync",
            "notice_ttl_ms",
            sync.notice_ttl_ms,
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_targets(targets: &TargetConfig) -> ConfigResult<()> {
    if targets.min_limit == 0 || targets.min_limit > targets.max_limit {
        return Err(ConfigError::invalid(
            "targets",
            "min_limit",
            targets.min_limit,
            "must be at least 1 and not exceed max_limit",
        ));
    }
    if !(targets.min_limit..=targets.max_limit).contains(&targets.default_limit) {
        return Err(ConfigError::invalid(
            "targets",
            "default_limit",
            targets.default_limit,
            "must fall within min_limit..=max_limit",
        ));
    }
    if targets.score_ceiling > 100 {
        return Err(ConfigError::invalid(
            "targets",
            "score_ceiling",
            targets.score_ceiling,
            "must not exceed 100",
        ));
    }
    if targets.maps_batch_cap == 0 || targets.instagram_batch_cap == 0 {
        return Err(ConfigError::InvalidField {
            section: "targets",
            field: "batch_cap",
            value: None,
            reason: "batch caps must be greater than zero",
        });
    }
    if targets.delimiters.is_empty() {
        return Err(ConfigError::InvalidField {
            section: "targets",
            field: "delimiters",
            value: None,
            reason: "at least one delimiter is required",
        });
    }
    Ok(())
}
