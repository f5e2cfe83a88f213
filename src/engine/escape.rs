//! Backslash escaping for literal document text
//!
//! Text nodes must read back as text, never as Markdown syntax. Two kinds of
//! characters are escaped:
//!
//! - anywhere: `\`, `*`, `_`, `` ` ``, `[`, `]` and runs of two or more `~`
//! - at the start of a line: ATX heading hashes, `>`, bullet markers,
//!   thematic breaks and setext underlines, ordered list numbers
//!
//! Fences need no rule of their own: their backticks and tildes are already
//! escaped inline.

use std::borrow::Cow;

const INLINE_SPECIAL: &[char] = &['\\', '*', '_', '`', '[', ']', '~'];

/// Escape `text` so it renders literally.
///
/// `line_start` tells whether the text begins a new line of output, where
/// block markers are significant.
///
/// ```rust
/// use html_md_converter::engine::escape_markdown;
///
/// assert_eq!(escape_markdown("# not a heading", true), "\\# not a heading");
/// assert_eq!(escape_markdown("1. not a list", true), "1\\. not a list");
/// assert_eq!(escape_markdown("1. mid-line", false), "1. mid-line");
/// assert_eq!(escape_markdown("*not em*", false), "\\*not em\\*");
/// ```
pub fn escape_markdown(text: &str, line_start: bool) -> Cow<'_, str> {
    let block_escape = if line_start {
        block_marker_offset(text)
    } else {
        None
    };
    if block_escape.is_none() && !text.contains(INLINE_SPECIAL) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        let inline = match ch {
            '~' => prev == Some('~') || next == Some('~'),
            _ => INLINE_SPECIAL.contains(&ch),
        };
        if inline || block_escape == Some(offset) {
            out.push('\\');
        }
        out.push(ch);
        prev = Some(ch);
    }

    Cow::Owned(out)
}

/// Byte offset of the character that would make `text` a block marker.
fn block_marker_offset(text: &str) -> Option<usize> {
    let first_word = text.split(' ').next().unwrap_or_default();
    let first = first_word.chars().next()?;

    match first {
        '#' => {
            let hashes = first_word.len();
            (first_word.bytes().all(|b| b == b'#') && hashes <= 6).then_some(0)
        }
        '>' => Some(0),
        '-' | '+' | '=' => first_word.chars().all(|c| c == first).then_some(0),
        '0'..='9' => {
            let digits = first_word.bytes().take_while(u8::is_ascii_digit).count();
            let rest = &first_word[digits..];
            (digits <= 9 && (rest == "." || rest == ")")).then_some(digits)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_borrowed() {
        assert!(matches!(escape_markdown("Hello, world!", true), Cow::Borrowed(_)));
        assert!(matches!(escape_markdown("a - b > c", false), Cow::Borrowed(_)));
    }

    #[test]
    fn test_inline_characters() {
        assert_eq!(escape_markdown("snake_case", false), "snake\\_case");
        assert_eq!(escape_markdown("a `tick`", false), "a \\`tick\\`");
        assert_eq!(escape_markdown("[text](url)", false), "\\[text\\](url)");
        assert_eq!(escape_markdown("C:\\dir", false), "C:\\\\dir");
    }

    #[test]
    fn test_tildes_only_in_runs() {
        assert_eq!(escape_markdown("~/home", false), "~/home");
        assert_eq!(escape_markdown("~~gone~~", false), "\\~\\~gone\\~\\~");
    }

    #[test]
    fn test_headings() {
        assert_eq!(escape_markdown("# title", true), "\\# title");
        assert_eq!(escape_markdown("###", true), "\\###");
        assert_eq!(escape_markdown("#hashtag", true), "#hashtag");
        assert_eq!(escape_markdown("####### seven", true), "####### seven");
    }

    #[test]
    fn test_quote_bullets_and_rules() {
        assert_eq!(escape_markdown("> quoted", true), "\\> quoted");
        assert_eq!(escape_markdown("- item", true), "\\- item");
        assert_eq!(escape_markdown("+ item", true), "\\+ item");
        assert_eq!(escape_markdown("* item", true), "\\* item");
        assert_eq!(escape_markdown("---", true), "\\---");
        assert_eq!(escape_markdown("===", true), "\\===");
        assert_eq!(escape_markdown("-1 degrees", true), "-1 degrees");
    }

    #[test]
    fn test_ordered_list_numbers() {
        assert_eq!(escape_markdown("1. first", true), "1\\. first");
        assert_eq!(escape_markdown("42) answer", true), "42\\) answer");
        assert_eq!(escape_markdown("2024.", true), "2024\\.");
        assert_eq!(escape_markdown("3.14 is pi", true), "3.14 is pi");
        assert_eq!(escape_markdown("1234567890. too long", true), "1234567890. too long");
    }

    #[test]
    fn test_fences() {
        assert_eq!(escape_markdown("```", true), "\\`\\`\\`");
        assert_eq!(escape_markdown("~~~ rust", true), "\\~\\~\\~ rust");
    }
}
