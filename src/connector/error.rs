//! Connector error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can surface from the connector.
///
/// Construction errors (`InvalidUrl`, `MissingBaseUrl`, `InvalidHeader`,
/// `Encode`) are raised before a request is registered. The rest are
/// delivered to the caller's completion.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Endpoint could not be parsed or joined onto the base URL.
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidUrl {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// Relative endpoint given but no base URL is configured.
    #[error("endpoint '{0}' is relative and no base_url is configured")]
    MissingBaseUrl(String),

    /// Token or header value contains characters not allowed in a header.
    #[error("invalid header value for '{0}'")]
    InvalidHeader(&'static str),

    /// Request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// Network, timeout or protocol failure from the HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        status: StatusCode,
        body: serde_json::Value,
    },

    /// Connector was created outside a Tokio runtime.
    #[error("no Tokio runtime available to dispatch requests")]
    NoRuntime,
}

impl ConnectorError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorError::InvalidUrl { .. } => "invalid_url",
            ConnectorError::MissingBaseUrl(_) => "missing_base_url",
            ConnectorError::InvalidHeader(_) => "invalid_header",
            ConnectorError::Encode(_) => "encode",
            ConnectorError::Transport(e) if e.is_timeout() => "timeout",
            ConnectorError::Transport(_) => "transport",
            ConnectorError::Status { .. } => "status",
            ConnectorError::NoRuntime => "no_runtime",
        }
    }

    /// HTTP status, if the server responded at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ConnectorError::Status { status, .. } => Some(*status),
            ConnectorError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Convenience alias used across the connector.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
