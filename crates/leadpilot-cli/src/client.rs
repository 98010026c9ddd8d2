//! Shared context and error type for command handlers.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use leadpilot_client::{ApiClient, HttpJobApi, HttpLeadApi};
use leadpilot_config::{ClientConfig, ConfigError};
use leadpilot_sync::{ApiError, NoticeLevel, QueueError, SyncContext};
use url::Url;

use crate::cli::GlobalArgs;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Server {
                status: 400 | 409 | 422,
                ..
            } => Self::validation(err.describe()),
            other => Self::failure(anyhow!(other.describe())),
        }
    }
}

impl From<QueueError> for CliError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Submit { source } => Self::from(source),
            QueueError::Pattern { .. } => Self::failure(err),
            QueueError::OverCap { kind, len, cap } => Self::validation(format!(
                "{len} {kind} targets queued but a batch carries at most {cap}"
            )),
            QueueError::Empty | QueueError::KindMismatch { .. } => Self::validation(err.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::validation(format!("{:#}", anyhow::Error::new(err)))
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
    pub(crate) sync: SyncContext,
}

impl AppContext {
    /// Load configuration, apply command-line overrides, and connect.
    pub(crate) fn build(args: &GlobalArgs) -> CliResult<Self> {
        let config = apply_overrides(leadpilot_config::load()?, args)?;
        leadpilot_config::validate::validate(&config)?;
        Self::from_config(config)
    }

    pub(crate) fn from_config(config: ClientConfig) -> CliResult<Self> {
        let api = ApiClient::new(&config.api)
            .map_err(|err| CliError::failure(anyhow::Error::new(err).context("failed to build HTTP client")))?;
        let sync = SyncContext::new(config)
            .map_err(|err| CliError::failure(anyhow!("failed to create metrics registry: {err}")))?;
        Ok(Self { api, sync })
    }

    #[cfg(test)]
    pub(crate) fn for_base_url(base_url: &str) -> CliResult<Self> {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url.to_string();
        Self::from_config(config)
    }

    pub(crate) fn leads(&self) -> Arc<HttpLeadApi> {
        Arc::new(self.api.leads())
    }

    pub(crate) fn jobs(&self) -> Arc<HttpJobApi> {
        Arc::new(self.api.jobs())
    }

    /// Print notices raised during the command to stderr.
    pub(crate) fn flush_notices(&self) {
        for notice in self.sync.notices.active() {
            eprintln!("{}", format_notice(notice.level, &notice.message));
        }
    }
}

pub(crate) fn format_notice(level: NoticeLevel, message: &str) -> String {
    let tag = match level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {message}")
}

fn apply_overrides(mut config: ClientConfig, args: &GlobalArgs) -> CliResult<ClientConfig> {
    if let Some(url) = &args.api_url {
        config.api.base_url = url.as_str().trim_end_matches('/').to_string();
    }
    if let Some(key) = &args.api_key {
        config.api.api_key = Some(key.clone());
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(CliError::validation("--timeout must be at least 1 second"));
        }
        config.api.request_timeout_ms = secs.saturating_mul(1_000);
        config.api.probe_timeout_ms = config.api.probe_timeout_ms.min(config.api.request_timeout_ms);
    }
    Ok(config)
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_validation_maps_to_exit_code_two() {
        let err = CliError::from(ApiError::Server {
            status: 422,
            detail: Some("limit too large".into()),
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "limit too large (HTTP 422)");

        let err = CliError::from(ApiError::Unreachable);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = GlobalArgs {
            api_url: parse_url("http://example.test:9000/").ok(),
            api_key: Some("secret".into()),
            timeout: Some(2),
            ..GlobalArgs::default()
        };
        let config = apply_overrides(ClientConfig::default(), &args);
        let Ok(config) = config else {
            panic!("overrides should apply");
        };
        assert_eq!(config.api.base_url, "http://example.test:9000");
        assert_eq!(config.api.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api.request_timeout_ms, 2_000);
        assert!(config.api.probe_timeout_ms <= 2_000);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = GlobalArgs {
            timeout: Some(0),
            ..GlobalArgs::default()
        };
        assert!(matches!(
            apply_overrides(ClientConfig::default(), &args),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn notices_render_with_level_tag() {
        assert_eq!(format_notice(NoticeLevel::Error, "boom"), "[error] boom");
    }
}
