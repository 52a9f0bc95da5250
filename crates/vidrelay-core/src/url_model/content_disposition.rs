//! Content-Disposition header construction and RFC 5987 percent coding.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything outside the RFC 5987 `attr-char` set.
const ATTR_CHAR_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Builds an `attachment` Content-Disposition value for an already sanitized name.
///
/// ASCII names produce `attachment; filename="name"`. Names with non-ASCII
/// characters get an ASCII fallback (`_` for each such char) plus
/// `filename*=UTF-8''percent-encoded`.
pub fn attachment_header(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();

    if ascii == filename {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii,
            utf8_percent_encode(filename, ATTR_CHAR_ESCAPES)
        )
    }
}

/// Lenient percent-decode: invalid escapes are kept verbatim, invalid UTF-8 is replaced.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
