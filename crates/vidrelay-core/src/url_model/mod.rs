//! URL validation and attachment filename derivation.
//!
//! [`validate`] is the first gate every request passes: it parses the raw URL
//! and applies the scheme and extension allow-lists without touching the
//! network. The filename helpers turn the URL's last path segment into a name
//! that is safe to place in a `Content-Disposition` header.

mod content_disposition;
mod path;
mod sanitize;
mod validate;

pub use content_disposition::{attachment_header, percent_decode};
pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename;
pub use validate::{
    validate, Rejection, UrlPolicy, ValidatedUrl, ALLOWED_SCHEMES, DEFAULT_EXTENSIONS,
};

use url::Url;

/// Filename used when the URL path yields nothing usable.
pub const DEFAULT_FILENAME: &str = "video";

/// Derives a safe attachment filename from the URL's last path segment.
///
/// The segment is percent-decoded and sanitized; an empty result, `.` or `..`
/// falls back to [`DEFAULT_FILENAME`].
///
/// # Examples
///
/// - `https://example.com/clip.mp4` → `"clip.mp4"`
/// - `https://example.com/` → `"video"`
pub fn derive_filename(url: &Url) -> String {
    let raw = match filename_from_url_path(url) {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };

    let sanitized = sanitize_filename(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}
