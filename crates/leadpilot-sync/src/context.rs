//! Shared dependencies handed to every sync component.

use std::sync::Arc;

use leadpilot_config::ClientConfig;
use leadpilot_telemetry::{SyncMetrics, TelemetryError};

use crate::notice::NoticeBoard;

/// Configuration, notices and metrics shared by the components of one view.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Effective client configuration.
    pub config: Arc<ClientConfig>,
    /// Notice sink.
    pub notices: NoticeBoard,
    /// Metrics registry.
    pub metrics: SyncMetrics,
}

impl SyncContext {
    /// Build a context with a fresh notice board and metrics registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics registry cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, TelemetryError> {
        let notices = NoticeBoard::new(config.sync.notice_ttl());
        Ok(Self {
            config: Arc::new(config),
            notices,
            metrics: SyncMetrics::new()?,
        })
    }
}
