//! Character encoding detection for byte input
//!
//! `Converter::convert` takes `&str`, so it never needs this module. Hosts that
//! only have raw response bytes go through `convert_bytes`, which picks the
//! encoding with a three-step cascade:
//!
//! 1. `charset` parameter of the Content-Type header
//! 2. `<meta charset>` or `<meta http-equiv="Content-Type">` in the first 1024 bytes
//! 3. UTF-8
//!
//! ```rust
//! use html_md_converter::charset::detect_charset;
//!
//! assert_eq!(detect_charset(Some("text/html; charset=iso-8859-1"), b""), "ISO-8859-1");
//! assert_eq!(detect_charset(None, b"<meta charset=\"utf-8\">"), "UTF-8");
//! assert_eq!(detect_charset(None, b"<p>plain</p>"), "UTF-8");
//! ```

use std::sync::OnceLock;

use encoding_rs::Encoding;
use regex::Regex;

use crate::error::ConversionError;

/// Charset used when neither the header nor the document declares one
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Meta declarations past this offset are ignored
const META_SCAN_LIMIT: usize = 1024;

fn content_type_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";,\s]+)"?"#).ok())
        .as_ref()
}

fn meta_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // Covers both `<meta charset=x>` and the http-equiv form, whose content
    // attribute carries its own `charset=` parameter.
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)<meta\s+(?:charset\s*=\s*"?([^";>\s]+)|http-equiv\s*=\s*"?content-type"?\s+content\s*=\s*"?[^">]*charset\s*=\s*([^";>\s]+))"#,
        )
        .ok()
    })
    .as_ref()
}

/// Pick the document charset, upper-cased.
pub fn detect_charset(content_type: Option<&str>, html: &[u8]) -> String {
    content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(html))
        .map(|label| label.to_uppercase())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}

/// `charset` parameter of a Content-Type header value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type_regex()?
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Charset declared by a `<meta>` tag near the start of the document
pub fn charset_from_meta(html: &[u8]) -> Option<String> {
    let prefix = String::from_utf8_lossy(&html[..html.len().min(META_SCAN_LIMIT)]);
    let caps = meta_regex()?.captures(&prefix)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Map a charset label to an `encoding_rs` encoding.
pub fn encoding_for(label: &str) -> Result<&'static Encoding, ConversionError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ConversionError::Encoding(format!("unsupported charset '{label}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_content_type_variants() {
        let cases = [
            ("text/html; charset=UTF-8", Some("UTF-8")),
            ("text/html; charset=\"ISO-8859-1\"", Some("ISO-8859-1")),
            ("text/html;charset=windows-1252", Some("windows-1252")),
            ("text/html; CHARSET=utf-8; boundary=x", Some("utf-8")),
            ("text/html", None),
            ("", None),
        ];
        for (header, expected) in cases {
            assert_eq!(
                charset_from_content_type(header).as_deref(),
                expected,
                "header: {header:?}"
            );
        }
    }

    #[test]
    fn test_meta_html5() {
        let html = b"<html><head><meta charset=\"shift_jis\"></head></html>";
        assert_eq!(charset_from_meta(html).as_deref(), Some("shift_jis"));
    }

    #[test]
    fn test_meta_http_equiv() {
        let html =
            b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">";
        assert_eq!(charset_from_meta(html).as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_meta_beyond_scan_limit_is_ignored() {
        let mut html = vec![b' '; META_SCAN_LIMIT];
        html.extend_from_slice(b"<meta charset=\"ISO-8859-1\">");
        assert_eq!(charset_from_meta(&html), None);
        assert_eq!(detect_charset(None, &html), DEFAULT_CHARSET);
    }

    #[test]
    fn test_default_is_utf8() {
        assert_eq!(detect_charset(None, b"<p>x</p>"), "UTF-8");
        assert_eq!(detect_charset(Some("text/html"), b""), "UTF-8");
    }

    #[test]
    fn test_encoding_lookup() {
        assert_eq!(encoding_for("ISO-8859-1").map(|e| e.name()).ok(), Some("windows-1252"));
        assert!(matches!(
            encoding_for("x-not-a-charset"),
            Err(ConversionError::Encoding(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_header_wins_over_meta(
            header in prop::sample::select(vec!["utf-8", "iso-8859-1", "windows-1252", "shift_jis"]),
            meta in prop::sample::select(vec!["UTF-8", "ISO-8859-1", "WINDOWS-1252", "SHIFT_JIS"]),
        ) {
            let content_type = format!("text/html; charset={header}");
            let html = format!(r#"<head><meta charset="{meta}"></head>"#);
            prop_assert_eq!(
                detect_charset(Some(&content_type), html.as_bytes()),
                header.to_uppercase()
            );
        }
    }
}
