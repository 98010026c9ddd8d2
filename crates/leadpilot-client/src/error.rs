//! Construction failures for the HTTP client.

use thiserror::Error;

/// Errors raised while building an [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL does not parse.
    #[error("invalid API base URL")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The API key cannot be sent as a header value.
    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,
    /// `reqwest` refused the client configuration.
    #[error("failed to build HTTP client")]
    Build {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },
}
