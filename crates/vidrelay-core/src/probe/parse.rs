//! Parse HTTP response headers into ProbeResult.

use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::StatusCode;

use super::ProbeResult;

/// Builds a ProbeResult from a response status and its headers.
///
/// A missing or non-UTF-8 `Content-Type` becomes the empty string; a missing
/// or non-numeric `Content-Length` becomes `None`.
pub fn probe_result_from_headers(status: StatusCode, headers: &HeaderMap) -> ProbeResult {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    ProbeResult {
        status_ok: status.is_success(),
        content_type,
        content_length,
    }
}
