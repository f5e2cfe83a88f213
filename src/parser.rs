//! HTML5 parsing front end
//!
//! Parsing is delegated to html5ever, which implements the WHATWG tree
//! construction algorithm. Malformed markup (unclosed or misnested tags,
//! stray end tags, broken attributes) is repaired the way a browser would,
//! so parsing itself never fails on `&str` input. The only failure mode is
//! on the byte path, when the input cannot be decoded with its charset.
//!
//! ```rust
//! use html_md_converter::parser::parse_str;
//!
//! let dom = parse_str("<h1>Hello");
//! assert!(!dom.document.children.borrow().is_empty());
//! ```

use std::borrow::Cow;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever_rcdom::RcDom;

use crate::charset::{detect_charset, encoding_for};
use crate::error::ConversionError;

fn parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Parse UTF-8 text into a DOM tree.
pub fn parse_str(html: &str) -> RcDom {
    parse_document(RcDom::default(), parse_opts()).one(html)
}

/// Parse raw bytes, decoding them with the detected charset first.
///
/// The charset comes from `content_type`, then a `<meta>` declaration, then
/// defaults to UTF-8. Bytes that are invalid for that charset are rejected
/// rather than replaced, so a wrong declaration surfaces as an error instead
/// of silently mangled text.
pub fn parse_bytes(html: &[u8], content_type: Option<&str>) -> Result<RcDom, ConversionError> {
    let text = decode(html, content_type)?;
    Ok(parse_str(&text))
}

/// Decode bytes to UTF-8 following the charset cascade.
pub fn decode<'a>(html: &'a [u8], content_type: Option<&str>) -> Result<Cow<'a, str>, ConversionError> {
    let charset = detect_charset(content_type, html);

    if charset.eq_ignore_ascii_case("UTF-8") || charset.eq_ignore_ascii_case("UTF8") {
        return std::str::from_utf8(html).map(Cow::Borrowed).map_err(|e| {
            ConversionError::Encoding(format!(
                "invalid UTF-8 at byte {}: {e}",
                e.valid_up_to()
            ))
        });
    }

    encoding_for(&charset)?
        .decode_without_bom_handling_and_without_replacement(html)
        .ok_or_else(|| {
            ConversionError::Encoding(format!("invalid byte sequence for charset '{charset}'"))
        })
}
