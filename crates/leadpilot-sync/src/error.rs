//! Error types for remote calls and target submission.

use leadpilot_api_models::TargetKind;
use thiserror::Error;

/// Failure reported by a remote collaborator.
///
/// Messages are constant; context lives in the fields so notices and logs can
/// format them consistently.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network request failed")]
    Transport {
        /// Transport-level detail.
        detail: String,
    },
    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
    },
    /// The server answered with a non-success status.
    #[error("server rejected the request")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail, when any.
        detail: Option<String>,
    },
    /// The response body did not match the expected shape.
    #[error("unexpected response body")]
    Decode {
        /// Decoder detail.
        detail: String,
    },
    /// A health probe concluded the backend cannot be reached.
    #[error("backend unreachable")]
    Unreachable,
}

impl ApiError {
    /// Whether the failure indicates the backend could not be reached at all.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Unreachable
        )
    }

    /// One-line description suitable for a user notice.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Server {
                status,
                detail: Some(detail),
            } => format!("{detail} (HTTP {status})"),
            Self::Server {
                status,
                detail: None,
            } => format!("{self} (HTTP {status})"),
            Self::Transport { detail } | Self::Decode { detail } => format!("{self}: {detail}"),
            Self::Timeout { operation } => format!("{operation} {self}"),
            Self::Unreachable => self.to_string(),
        }
    }
}

/// Convenience alias for remote call results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures raised by the target queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Submit was called with nothing queued.
    #[error("target queue is empty")]
    Empty,
    /// The queue holds more targets than one batch may carry.
    #[error("target batch exceeds the per-source cap")]
    OverCap {
        /// Source of the queue.
        kind: TargetKind,
        /// Queued targets.
        len: usize,
        /// Allowed targets.
        cap: usize,
    },
    /// A target of the wrong source was offered to the queue.
    #[error("target source does not match the queue")]
    KindMismatch {
        /// Queue source.
        expected: TargetKind,
        /// Offered source.
        found: TargetKind,
    },
    /// The batch submission call failed; the queue is kept.
    #[error("batch submission failed")]
    Submit {
        /// Remote failure.
        #[source]
        source: ApiError,
    },
    /// The sanitizer pattern failed to compile.
    #[error("failed to compile target sanitizer")]
    Pattern {
        /// Regex compilation failure.
        #[source]
        source: regex::Error,
    },
}
