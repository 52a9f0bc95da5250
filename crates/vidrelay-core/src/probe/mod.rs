//! Probe phase: HTTP HEAD / metadata check.
//!
//! Reads the declared `Content-Type` and `Content-Length` without transferring
//! the body, so obviously wrong or oversized resources are refused before the
//! relay commits to a full GET. The result is advisory only; the streaming
//! phase enforces the byte ceiling again on the actual bytes.

mod parse;
mod policy;

pub use parse::probe_result_from_headers;
pub use policy::{check_probe, is_video_content_type};

use std::time::Duration;

use crate::error::{RelayError, Result};
use crate::url_model::ValidatedUrl;

/// Result of a HEAD request: the headers the size and type policy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// True if the origin answered with a 2xx status.
    pub status_ok: bool,
    /// `Content-Type` value, or empty if the origin sent none.
    pub content_type: String,
    /// Declared size in bytes, if `Content-Length` is present and numeric.
    pub content_length: Option<u64>,
}

/// Performs a HEAD request and returns parsed metadata.
///
/// Follows redirects (client policy). Fails with `UpstreamProbeFailed` on
/// transport errors, timeouts, and non-2xx statuses. Does not apply the
/// content policy; see [`check_probe`].
pub async fn probe(
    client: &reqwest::Client,
    url: &ValidatedUrl,
    timeout: Duration,
) -> Result<ProbeResult> {
    let response = client
        .head(url.as_url().clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| RelayError::probe_transport(&e))?;

    let status = response.status();
    let result = probe_result_from_headers(status, response.headers());
    if !result.status_ok {
        return Err(RelayError::probe_status(status));
    }

    tracing::debug!(
        url = %url,
        content_type = %result.content_type,
        content_length = ?result.content_length,
        "probe completed"
    );
    Ok(result)
}
