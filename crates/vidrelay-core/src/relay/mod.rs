//! The relay: probe-then-stream against the remote origin.
//!
//! A request goes through [`Relay::validate`] (no I/O), [`Relay::probe`] (HEAD
//! plus content policy), then [`Relay::open_stream`] (GET) whose body is piped
//! to the client or to any `AsyncWrite` via [`Relay::stream_to`]. The byte
//! ceiling is checked against the declared length at both round trips and
//! against the actual bytes while copying.

mod capped;
mod session;

pub use capped::CappedBody;
pub use session::{StreamOutcome, StreamSession, FALLBACK_CONTENT_TYPE};

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::probe::{self, ProbeResult};
use crate::url_model::{self, UrlPolicy, ValidatedUrl};

/// Default ceiling: 200 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 200 * 1024 * 1024;

/// Default forwarded chunk size: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Maximum redirects followed on probe and fetch.
const MAX_REDIRECTS: usize = 10;

/// Limits applied to every relayed request.
#[derive(Debug, Clone)]
pub struct RelayPolicy {
    /// Ceiling on declared and actual bytes.
    pub max_bytes: u64,
    /// Largest chunk forwarded to the sink in one write.
    pub chunk_size: usize,
    /// Extension allow-list.
    pub urls: UrlPolicy,
    /// Deadline for the HEAD round trip.
    pub probe_timeout: Duration,
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            urls: UrlPolicy::default(),
            probe_timeout: Duration::from_secs(15),
        }
    }
}

impl RelayPolicy {
    pub fn from_config(cfg: &RelayConfig) -> Self {
        Self {
            max_bytes: cfg.max_bytes,
            chunk_size: cfg.chunk_size,
            urls: UrlPolicy::new(&cfg.allowed_extensions),
            probe_timeout: Duration::from_secs(cfg.probe_timeout_secs),
        }
    }
}

/// Shared relay handle. Cheap to clone; holds the pooled upstream client.
#[derive(Clone)]
pub struct Relay {
    client: reqwest::Client,
    policy: Arc<RelayPolicy>,
}

impl Relay {
    /// Builds a relay with its own upstream client.
    ///
    /// `connect_timeout` bounds connection setup; `read_timeout` bounds each
    /// read so a stalled origin cannot hold a task forever.
    pub fn new(
        policy: RelayPolicy,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RelayError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, policy))
    }

    pub fn with_client(client: reqwest::Client, policy: RelayPolicy) -> Self {
        Self {
            client,
            policy: Arc::new(policy),
        }
    }

    pub fn from_config(cfg: &RelayConfig) -> Result<Self> {
        Self::new(
            RelayPolicy::from_config(cfg),
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(cfg.read_idle_timeout_secs),
        )
    }

    pub fn policy(&self) -> &RelayPolicy {
        &self.policy
    }

    /// Validator step. Pure.
    pub fn validate(&self, raw: &str) -> Result<ValidatedUrl> {
        Ok(url_model::validate(raw, &self.policy.urls)?)
    }

    /// Probe step: HEAD round trip, then type and declared-size policy.
    pub async fn probe(&self, url: &ValidatedUrl) -> Result<ProbeResult> {
        let result = probe::probe(&self.client, url, self.policy.probe_timeout).await?;
        probe::check_probe(&result, self.policy.max_bytes)?;
        Ok(result)
    }

    /// Stream step: issues the GET and returns the session before any body
    /// byte is read.
    ///
    /// The GET's own `Content-Length` is checked against the ceiling again,
    /// since the origin may answer differently than it did to the probe.
    pub async fn open_stream(
        &self,
        url: &ValidatedUrl,
        probe: &ProbeResult,
    ) -> Result<StreamSession> {
        let response = self
            .client
            .get(url.as_url().clone())
            .send()
            .await
            .map_err(|e| RelayError::fetch_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::fetch_status(status));
        }

        let headers = probe::probe_result_from_headers(status, response.headers());
        if let Some(declared) = headers.content_length {
            if declared > self.policy.max_bytes {
                return Err(RelayError::RemoteTooLarge {
                    declared,
                    limit: self.policy.max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let filename = url.filename();

        tracing::info!(
            url = %url,
            filename = %filename,
            probed_length = ?probe.content_length,
            content_length = ?headers.content_length,
            "starting stream"
        );

        let body = CappedBody::new(
            response.bytes_stream(),
            self.policy.max_bytes,
            self.policy.chunk_size,
            url.as_str(),
        );

        Ok(StreamSession {
            content_type,
            content_length: headers.content_length,
            filename,
            body,
        })
    }

    /// Opens the stream and copies it into `sink` chunk by chunk.
    ///
    /// Memory use is bounded by the chunk size. On failure the sink holds
    /// whatever was written before the error; callers discard it.
    pub async fn stream_to<W>(
        &self,
        url: &ValidatedUrl,
        probe: &ProbeResult,
        sink: &mut W,
    ) -> Result<StreamOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        let session = self.open_stream(url, probe).await?;
        let content_type = session.content_type().to_string();
        let filename = session.filename().to_string();

        let mut body = session.into_body();
        while let Some(chunk) = body.next().await {
            sink.write_all(&chunk?).await.map_err(RelayError::SinkWrite)?;
        }
        sink.flush().await.map_err(RelayError::SinkWrite)?;

        Ok(StreamOutcome {
            bytes_written: body.forwarded(),
            content_type,
            filename,
        })
    }
}
