//! Byte-capped, re-chunking view over an upstream response body.

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::error::RelayError;

/// Wraps an upstream byte stream and enforces the ceiling per chunk.
///
/// - Upstream chunks are split so no yielded chunk exceeds `chunk_size`.
/// - A running counter tracks bytes accepted from upstream. The chunk that
///   would push it past `limit` is never yielded; the stream instead yields
///   `StreamTruncated` once and ends.
/// - Dropping the body before it ends (client went away) drops the upstream
///   response with it, releasing the connection.
pub struct CappedBody {
    inner: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    pending: Option<Bytes>,
    limit: u64,
    chunk_size: usize,
    received: u64,
    forwarded: u64,
    finished: bool,
    label: String,
}

impl CappedBody {
    pub fn new<S>(inner: S, limit: u64, chunk_size: usize, label: impl Into<String>) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            inner: inner.boxed(),
            pending: None,
            limit,
            chunk_size: chunk_size.max(1),
            received: 0,
            forwarded: 0,
            finished: false,
            label: label.into(),
        }
    }

    /// Bytes yielded to the consumer so far.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }
}

impl Stream for CappedBody {
    type Item = Result<Bytes, RelayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            if let Some(pending) = this.pending.as_mut() {
                if !pending.is_empty() {
                    let take = pending.len().min(this.chunk_size);
                    let chunk = pending.split_to(take);
                    this.forwarded += chunk.len() as u64;
                    return Poll::Ready(Some(Ok(chunk)));
                }
                this.pending = None;
            }

            match ready!(this.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    let total = this.received + chunk.len() as u64;
                    if total > this.limit {
                        this.finished = true;
                        tracing::warn!(
                            url = %this.label,
                            forwarded = this.forwarded,
                            limit = this.limit,
                            "stream exceeded size limit; aborting transfer"
                        );
                        return Poll::Ready(Some(Err(RelayError::StreamTruncated {
                            limit: this.limit,
                        })));
                    }
                    this.received = total;
                    this.pending = Some(chunk);
                }
                Some(Err(e)) => {
                    this.finished = true;
                    tracing::warn!(
                        url = %this.label,
                        forwarded = this.forwarded,
                        error = %e,
                        "upstream read failed mid-stream"
                    );
                    return Poll::Ready(Some(Err(RelayError::StreamRead {
                        received: this.received,
                        source: e,
                    })));
                }
                None => {
                    this.finished = true;
                    tracing::info!(url = %this.label, bytes = this.forwarded, "stream completed");
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl Drop for CappedBody {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                url = %self.label,
                forwarded = self.forwarded,
                "client went away mid-stream; releasing upstream"
            );
        }
    }
}
