//! Relay error types and their classification.
//!
//! Every failure the validator or relay can produce is a `RelayError`. The
//! HTTP boundary maps it to a status code via [`RelayError::status`]; callers
//! that only care about the broad category use [`RelayError::kind`].

use axum::http::StatusCode;
use thiserror::Error;

use crate::url_model::Rejection;

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, RelayError>;

/// High-level classification of a relay failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or disallowed URL. Client error; retrying will not help.
    InputRejected,
    /// Probe or fetch failed at the origin. Transient; safe to retry.
    UpstreamUnavailable,
    /// Not a video, or too large. Deterministic.
    PolicyViolation,
    /// Transfer aborted after streaming started (size overrun, read or sink failure).
    StreamInterrupted,
    /// Anything else (client construction, unexpected faults).
    Internal,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The HEAD probe failed or returned a non-2xx status.
    #[error("upstream probe failed: {detail}")]
    UpstreamProbeFailed { status: Option<u16>, detail: String },

    /// The GET request failed or returned a non-2xx status.
    #[error("upstream fetch failed: {detail}")]
    UpstreamFetchFailed { status: Option<u16>, detail: String },

    #[error("remote content type {content_type:?} is not a video")]
    NotAVideo { content_type: String },

    #[error("remote file declares {declared} bytes, over the {limit} byte limit")]
    RemoteTooLarge { declared: u64, limit: u64 },

    #[error("stream aborted: more than {limit} bytes received")]
    StreamTruncated { limit: u64 },

    #[error("upstream read failed after {received} bytes: {source}")]
    StreamRead {
        received: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("output write failed: {0}")]
    SinkWrite(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub(crate) fn probe_status(status: StatusCode) -> Self {
        Self::UpstreamProbeFailed {
            status: Some(status.as_u16()),
            detail: format!("HEAD returned HTTP {}", status.as_u16()),
        }
    }

    pub(crate) fn probe_transport(err: &reqwest::Error) -> Self {
        Self::UpstreamProbeFailed {
            status: None,
            detail: transport_detail(err),
        }
    }

    pub(crate) fn fetch_status(status: StatusCode) -> Self {
        Self::UpstreamFetchFailed {
            status: Some(status.as_u16()),
            detail: format!("GET returned HTTP {}", status.as_u16()),
        }
    }

    pub(crate) fn fetch_transport(err: &reqwest::Error) -> Self {
        Self::UpstreamFetchFailed {
            status: None,
            detail: transport_detail(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Rejected(_) => ErrorKind::InputRejected,
            RelayError::UpstreamProbeFailed { .. } | RelayError::UpstreamFetchFailed { .. } => {
                ErrorKind::UpstreamUnavailable
            }
            RelayError::NotAVideo { .. } | RelayError::RemoteTooLarge { .. } => {
                ErrorKind::PolicyViolation
            }
            RelayError::StreamTruncated { .. }
            | RelayError::StreamRead { .. }
            | RelayError::SinkWrite(_) => ErrorKind::StreamInterrupted,
            RelayError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when the client may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamUnavailable
    }

    /// Status code for failures detected before any response bytes were sent.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Rejected(_) | RelayError::NotAVideo { .. } => StatusCode::BAD_REQUEST,
            RelayError::UpstreamProbeFailed { .. } | RelayError::UpstreamFetchFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RelayError::RemoteTooLarge { .. } | RelayError::StreamTruncated { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            RelayError::StreamRead { .. } => StatusCode::BAD_GATEWAY,
            RelayError::SinkWrite(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short message safe to show to the requesting client.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::Rejected(r) => r.to_string(),
            RelayError::UpstreamProbeFailed { status: Some(code), .. }
            | RelayError::UpstreamFetchFailed { status: Some(code), .. } => {
                format!("Remote server responded with HTTP {}", code)
            }
            RelayError::UpstreamProbeFailed { .. } | RelayError::UpstreamFetchFailed { .. } => {
                "Could not reach the remote server".to_string()
            }
            RelayError::NotAVideo { .. } => "The URL does not point to a video".to_string(),
            RelayError::RemoteTooLarge { .. } | RelayError::StreamTruncated { .. } => {
                "The video is too large".to_string()
            }
            RelayError::StreamRead { .. } => "The remote transfer was interrupted".to_string(),
            RelayError::SinkWrite(_) | RelayError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

fn transport_detail(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else if err.is_redirect() {
        "too many redirects".to_string()
    } else {
        err.to_string()
    }
}
