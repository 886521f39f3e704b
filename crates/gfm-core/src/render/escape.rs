//! HTML and URL escaping.

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped_html(&mut result, s);
    result
}

pub(crate) fn push_escaped_html(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Escape a URL for an `href`/`src` attribute: percent-encode bytes
/// outside the URL-safe set, entity-encode `&` and `'`.
#[must_use]
pub fn escape_href(url: &str) -> String {
    let mut result = String::with_capacity(url.len());
    for &byte in url.as_bytes() {
        match byte {
            b'&' => result.push_str("&amp;"),
            b'\'' => result.push_str("&#x27;"),
            b'a'..=b'z'
            | b'A'..=b'Z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'+'
            | b'!'
            | b'*'
            | b'('
            | b')'
            | b','
            | b'%'
            | b'#'
            | b'@'
            | b'?'
            | b'='
            | b';'
            | b':'
            | b'/'
            | b'$'
            | b'~' => result.push(char::from(byte)),
            _ => {
                use std::fmt::Write;
                let _ = write!(result, "%{byte:02X}");
            }
        }
    }
    result
}

/// Whether a URL may be emitted without `UNSAFE`.
///
/// Script-capable schemes are rejected; `data:` is only allowed for
/// common raster image types.
#[must_use]
pub fn is_safe_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("data:") {
        return ["data:image/png", "data:image/gif", "data:image/jpeg", "data:image/webp"]
            .iter()
            .any(|prefix| lower.starts_with(prefix));
    }
    !["javascript:", "vbscript:", "file:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
