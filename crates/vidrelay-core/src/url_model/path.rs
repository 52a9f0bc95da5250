//! Filename extraction from URL path.

use url::Url;

use super::content_disposition::percent_decode;

/// Last non-empty path segment, still percent-encoded.
pub(super) fn last_path_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.filter(|s| !s.is_empty()).last()
}

/// Extracts the last path segment from a URL for use as a filename hint.
///
/// Returns `None` if the path is empty/root or the segment is `.`/`..`.
pub fn filename_from_url_path(url: &Url) -> Option<String> {
    let segment = percent_decode(last_path_segment(url)?);
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}
