//! Layered configuration loading.
//!
//! # Design
//! - Defaults, then an optional JSON file named by `LEADPILOT_CONFIG`, then
//!   `LEADPILOT_*` overrides, then validation.
//! - Environment access goes through an injected lookup so callers and tests
//!   control the source.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ClientConfig;
use crate::validate::validate;

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "LEADPILOT_";
/// Variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "LEADPILOT_CONFIG";

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed, an override
/// is malformed, or the merged result fails validation.
pub fn load() -> ConfigResult<ClientConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` in place of the process environment.
///
/// # Errors
///
/// Same conditions as [`load`].
pub fn load_with<F>(lookup: F) -> ConfigResult<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_ENV)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
    {
        Some(path) => from_file(Path::new(&path))?,
        None => ClientConfig::default(),
    };
    apply_env(&mut config, &lookup)?;
    validate(&config)?;
    Ok(config)
}

/// Read a (possibly partial) JSON config document.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
pub fn from_file(path: &Path) -> ConfigResult<ClientConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

fn apply_env<F>(config: &mut ClientConfig, lookup: &F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = string_var(lookup, "API_URL") {
        config.api.base_url = url;
    }
    if let Some(key) = string_var(lookup, "API_KEY") {
        config.api.api_key = Some(key);
    }
    overlay(lookup, "REQUEST_TIMEOUT_MS", &mut config.api.request_timeout_ms)?;
    overlay(lookup, "PROBE_TIMEOUT_MS", &mut config.api.probe_timeout_ms)?;
    overlay(lookup, "DEBOUNCE_MS", &mut config.sync.debounce_ms)?;
    overlay(lookup, "POLL_INTERVAL_MS", &mut config.sync.poll_interval_ms)?;
    overlay(lookup, "PAGE_SIZE", &mut config.sync.page_size)?;
    overlay(lookup, "NOTICE_TTL_MS", &mut config.sync.notice_ttl_ms)?;
    overlay(
        lookup,
        "LEADS_STALE_AFTER_SECS",
        &mut config.sync.leads_stale_after_secs,
    )?;
    overlay(
        lookup,
        "JOBS_STALE_AFTER_SECS",
        &mut config.sync.jobs_stale_after_secs,
    )?;
    Ok(())
}

fn string_var<F>(lookup: &F, suffix: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&format!("{ENV_PREFIX}{suffix}"))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn overlay<F, T>(lookup: &F, suffix: &str, slot: &mut T) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = string_var(lookup, suffix) else {
        return Ok(());
    };
    *slot = raw.parse().map_err(|_| ConfigError::InvalidEnv {
        key: format!("{ENV_PREFIX}{suffix}"),
        value: raw.clone(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let config = load_with(env(&[]))?;
        assert_eq!(config, ClientConfig::default());
        Ok(())
    }

    #[test]
    fn overrides_apply_and_blank_values_are_ignored() -> ConfigResult<()> {
        let config = load_with(env(&[
            ("LEADPILOT_API_URL", "https://api.example.test"),
            ("LEADPILOT_API_KEY", "  "),
            ("LEADPILOT_PAGE_SIZE", "20"),
            ("LEADPILOT_POLL_INTERVAL_MS", " 2500 "),
        ]))?;
        assert_eq!(config.api.base_url, "https://api.example.test");
        assert!(config.api.api_key.is_none());
        assert_eq!(config.sync.page_size, 20);
        assert_eq!(config.sync.poll_interval_ms, 2_500);
        Ok(())
    }

    #[test]
    fn malformed_override_names_the_variable() {
        let err = load_with(env(&[("LEADPILOT_DEBOUNCE_MS", "soon")]));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidEnv { ref key, .. }) if key == "LEADPILOT_DEBOUNCE_MS"
        ));
    }
}
