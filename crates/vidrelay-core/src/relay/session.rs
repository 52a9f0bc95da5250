//! Live stream state handed to the output side.

use super::capped::CappedBody;
use crate::url_model::attachment_header;

/// Content type sent when the origin declares none.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// An open upstream GET whose headers have been checked and whose body is
/// ready to be piped. Owned by exactly one request.
pub struct StreamSession {
    pub(super) content_type: String,
    pub(super) content_length: Option<u64>,
    pub(super) filename: String,
    pub(super) body: CappedBody,
}

impl StreamSession {
    /// Upstream `Content-Type`, or [`FALLBACK_CONTENT_TYPE`].
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Upstream `Content-Length` if declared (always within the ceiling).
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// `Content-Disposition` value for the attachment.
    pub fn content_disposition(&self) -> String {
        attachment_header(&self.filename)
    }

    pub fn into_body(self) -> CappedBody {
        self.body
    }
}

/// Summary of a stream copied into a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub bytes_written: u64,
    pub content_type: String,
    pub filename: String,
}
