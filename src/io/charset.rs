//! Text decoding for fetched HTML pages.
//!
//! The encoding is taken from, in order:
//! - a byte order mark
//! - the `charset` parameter of the `Content-Type` header
//! - `<meta charset="...">` or `<meta http-equiv="Content-Type" content="...; charset=...">`
//!   within the first 1024 bytes
//! - UTF-8 otherwise
//!
//! Undecodable sequences become U+FFFD instead of failing.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use tracing::debug;

/// How far into the document a `<meta>` declaration is looked for
const META_SCAN_LIMIT: usize = 1024;

static HEADER_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_.:\-]+)"#).expect("valid charset pattern")
});

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?([A-Za-z0-9_.:\-]+)"#)
        .expect("valid meta charset pattern")
});

/// Decode an HTML body to a `String` using the declared encoding.
pub fn decode_html(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(|ct| label_from(&HEADER_CHARSET, ct.as_bytes()))
        .or_else(|| label_from(&META_CHARSET, &body[..body.len().min(META_SCAN_LIMIT)]))
        .unwrap_or(UTF_8);

    // `decode` gives a BOM precedence over the declared encoding
    let (text, used, had_errors) = encoding.decode(body);
    debug!(encoding = used.name(), had_errors, "Decoded page");
    text.into_owned()
}

fn label_from(pattern: &Regex, haystack: &[u8]) -> Option<&'static Encoding> {
    let caps = pattern.captures(haystack)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "決算" in Shift_JIS
    const KESSAN_SJIS: &[u8] = &[0x8C, 0x88, 0x8E, 0x5A];

    fn page(head: &str, text: &[u8]) -> Vec<u8> {
        let mut html = format!("<html><head>{head}</head><body><a href=\"a.pdf\">").into_bytes();
        html.extend_from_slice(text);
        html.extend_from_slice(b"</a></body></html>");
        html
    }

    #[test]
    fn header_charset_is_used() {
        let body = page("", KESSAN_SJIS);
        let text = decode_html(&body, Some("text/html; charset=Shift_JIS"));
        assert!(text.contains("決算"));
    }

    #[test]
    fn quoted_header_charset_is_used() {
        let body = page("", KESSAN_SJIS);
        let text = decode_html(&body, Some(r#"text/html; Charset="shift_jis""#));
        assert!(text.contains("決算"));
    }

    #[test]
    fn meta_charset_is_used_without_header() {
        let body = page(r#"<meta charset="Shift_JIS">"#, KESSAN_SJIS);
        assert!(decode_html(&body, Some("text/html")).contains("決算"));
        assert!(decode_html(&body, None).contains("決算"));
    }

    #[test]
    fn http_equiv_meta_is_used() {
        let body = page(
            r#"<meta http-equiv="Content-Type" content="text/html; charset=EUC-JP">"#,
            &[0xB7, 0xE8, 0xBB, 0xBB],
        );
        assert!(decode_html(&body, None).contains("決算"));
    }

    #[test]
    fn header_wins_over_meta() {
        let body = page(r#"<meta charset="EUC-JP">"#, KESSAN_SJIS);
        assert!(decode_html(&body, Some("text/html; charset=Shift_JIS")).contains("決算"));
    }

    #[test]
    fn falls_back_to_utf8() {
        let body = page("", "決算".as_bytes());
        assert!(decode_html(&body, None).contains("決算"));
        assert!(decode_html(&body, Some("text/html; charset=bogus")).contains("決算"));
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        assert_eq!(decode_html(b"<p>ok \xff</p>", None), "<p>ok \u{fffd}</p>");
    }
}
