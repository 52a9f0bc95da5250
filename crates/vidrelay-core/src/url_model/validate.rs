//! URL validation: absolute parse, scheme allow-list, extension allow-list.

use std::fmt;
use thiserror::Error;
use url::Url;

use super::content_disposition::percent_decode;
use super::path::last_path_segment;

/// Schemes the relay will fetch from.
pub const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Default extension allow-list (lowercase, with leading dot).
pub const DEFAULT_EXTENSIONS: [&str; 5] = [".mp4", ".webm", ".mkv", ".mov", ".flv"];

/// Why a raw URL was refused before any network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Missing url parameter")]
    MissingUrl,
    #[error("Invalid URL: {0}")]
    MalformedUrl(String),
    #[error("Only http and https URLs are allowed")]
    SchemeNotAllowed { scheme: String },
    #[error("Only direct video file links are allowed")]
    ExtensionNotAllowed,
}

/// Extension allow-list applied to the final path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    extensions: Vec<String>,
}

impl UrlPolicy {
    /// Builds a policy from extensions such as `"mp4"` or `".MP4"`.
    /// Entries are lowercased and given a leading dot; blanks are dropped.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|e| {
                let e = e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
                (!e.is_empty()).then(|| format!(".{}", e))
            })
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// True if `segment` (already decoded) ends with an allowed extension.
    pub fn allows_extension(&self, segment: &str) -> bool {
        let lower = segment.to_lowercase();
        self.extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

/// A URL that passed [`validate`]. Keeps the parsed form so the relay never re-parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl {
    url: Url,
}

impl ValidatedUrl {
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Attachment filename derived from the last path segment.
    pub fn filename(&self) -> String {
        super::derive_filename(&self.url)
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Validates a raw URL string. Pure: no network or filesystem access.
///
/// Checks run in order and stop at the first failure: non-empty, absolute
/// parse, scheme in [`ALLOWED_SCHEMES`], final path segment extension.
pub fn validate(raw: &str, policy: &UrlPolicy) -> Result<ValidatedUrl, Rejection> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Rejection::MissingUrl);
    }

    let url = Url::parse(raw).map_err(|e| Rejection::MalformedUrl(e.to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Rejection::SchemeNotAllowed {
            scheme: url.scheme().to_string(),
        });
    }

    let segment = last_path_segment(&url).map(percent_decode);
    match segment {
        Some(s) if policy.allows_extension(&s) => Ok(ValidatedUrl { url }),
        _ => Err(Rejection::ExtensionNotAllowed),
    }
}
