//! Content policy applied to a probe result. Local; no I/O.

use crate::error::{RelayError, Result};

use super::ProbeResult;

/// True if the MIME type is in the `video/` family (case-insensitive).
pub fn is_video_content_type(content_type: &str) -> bool {
    let ct = content_type.trim_start();
    ct.len() >= 6 && ct.as_bytes()[..6].eq_ignore_ascii_case(b"video/")
}

/// Applies the type and declared-size policy.
///
/// The type check runs first. A missing length passes; a declared length
/// above `max_bytes` fails with `RemoteTooLarge`.
pub fn check_probe(probe: &ProbeResult, max_bytes: u64) -> Result<()> {
    if !is_video_content_type(&probe.content_type) {
        return Err(RelayError::NotAVideo {
            content_type: probe.content_type.clone(),
        });
    }
    if let Some(declared) = probe.content_length {
        if declared > max_bytes {
            return Err(RelayError::RemoteTooLarge {
                declared,
                limit: max_bytes,
            });
        }
    }
    Ok(())
}
