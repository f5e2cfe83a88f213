//! Final normalization pass over rendered Markdown
//!
//! Identical HTML must always produce byte-identical Markdown, so the raw
//! renderer output is brought into one canonical shape:
//!
//! 1. **Line endings**: LF only
//! 2. **Trailing whitespace**: removed from every line
//! 3. **Blank lines**: runs collapsed to one, except inside fenced code
//! 4. **Spaces**: runs collapsed to one outside code, leading indentation kept
//! 5. **Edges**: leading and trailing blank lines removed, no final newline
//!
//! ```text
//! "Line 1\r\n\r\n\r\nLine  2  \n"  ->  "Line 1\n\nLine 2"
//! ```

/// Normalize raw renderer output.
pub fn normalize_output(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut result = String::with_capacity(text.len());
    let mut fence: Option<Fence> = None;
    let mut pending_blank = false;

    for line in text.lines() {
        let trimmed = line.trim_end();

        if let Some(open) = fence {
            result.push_str(trimmed);
            result.push('\n');
            if open.is_closed_by(trimmed) {
                fence = None;
            }
            continue;
        }

        if trimmed.is_empty() {
            if !result.is_empty() {
                pending_blank = true;
            }
            continue;
        }

        if pending_blank {
            result.push('\n');
            pending_blank = false;
        }

        fence = Fence::opened_by(trimmed);
        if fence.is_some() {
            result.push_str(trimmed);
        } else {
            result.push_str(&normalize_line_whitespace(trimmed));
        }
        result.push('\n');
    }

    let end = result.trim_end_matches('\n').len();
    result.truncate(end);
    result
}

/// An open fenced code block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn opened_by(line: &str) -> Option<Self> {
        let body = strip_container_prefix(line);
        let marker = body.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = body.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        // A backtick fence cannot carry backticks in its info string
        if marker == '`' && body[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let body = strip_container_prefix(line);
        let run = body.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && body[run * self.marker.len_utf8()..].trim().is_empty()
    }
}

/// Skip list indentation and blockquote markers in front of a fence.
fn strip_container_prefix(line: &str) -> &str {
    line.trim_start_matches([' ', '>'])
}

/// Collapse runs of spaces within one line.
///
/// Leading spaces are list indentation and stay as they are. Spaces inside
/// inline code spans are content and stay too; a span closes only on a
/// backtick run of the same length as the one that opened it. An escaped
/// backtick never opens a span.
fn normalize_line_whitespace(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut at_start = true;
    let mut prev_space = false;
    let mut code_delimiter: Option<usize> = None;

    while let Some(ch) = chars.next() {
        match ch {
            // Escaped character outside code: copy the pair untouched
            '\\' if code_delimiter.is_none() => {
                result.push(ch);
                if let Some(escaped) = chars.next() {
                    result.push(escaped);
                }
                at_start = false;
                prev_space = false;
            }
            '`' => {
                let mut run = 1;
                while chars.next_if_eq(&'`').is_some() {
                    run += 1;
                }
                result.extend(std::iter::repeat_n('`', run));
                code_delimiter = match code_delimiter {
                    Some(open) if open == run => None,
                    Some(open) => Some(open),
                    None => Some(run),
                };
                at_start = false;
                prev_space = false;
            }
            ' ' if at_start || code_delimiter.is_some() => result.push(ch),
            ' ' => {
                if !prev_space {
                    result.push(ch);
                    prev_space = true;
                }
            }
            _ => {
                result.push(ch);
                at_start = false;
                prev_space = false;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_to_lf() {
        assert_eq!(normalize_output("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(normalize_output("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_trailing_whitespace_removed() {
        assert_eq!(normalize_output("a   \nb\t\n"), "a\nb");
    }

    #[test]
    fn test_edges_trimmed() {
        assert_eq!(normalize_output("\n\n  \n# Title\n\n\n"), "# Title");
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert_eq!(normalize_output(""), "");
        assert_eq!(normalize_output("  \n\t\n \r\n"), "");
    }

    #[test]
    fn test_consecutive_spaces_collapsed() {
        assert_eq!(normalize_output("a    b  c"), "a b c");
    }

    #[test]
    fn test_leading_indentation_kept() {
        assert_eq!(normalize_output("- a\n    - b"), "- a\n    - b");
    }

    #[test]
    fn test_inline_code_spaces_kept() {
        assert_eq!(normalize_output("x  `a   b`  y"), "x `a   b` y");
        assert_eq!(normalize_output("``a ` b   c``  d"), "``a ` b   c`` d");
    }

    #[test]
    fn test_code_block_kept_verbatim() {
        let input = "```rust\nfn  test()  {\n\n\n    let  x  =  5;\n}\n```\n\n\ntext  here";
        assert_eq!(
            normalize_output(input),
            "```rust\nfn  test()  {\n\n\n    let  x  =  5;\n}\n```\n\ntext here"
        );
    }

    #[test]
    fn test_longer_fence_not_closed_by_shorter() {
        let input = "````\n```\ninner  code\n```\n````\nafter  x";
        assert_eq!(
            normalize_output(input),
            "````\n```\ninner  code\n```\n````\nafter x"
        );
    }

    #[test]
    fn test_fence_inside_blockquote() {
        let input = "> ```\n> a    b\n> ```";
        assert_eq!(normalize_output(input), input);
    }

    #[test]
    fn test_idempotent() {
        let input = "# T\n\n\n- a   b\n  - c\n\n```\nx  y\n\n\nz\n```\n";
        let once = normalize_output(input);
        assert_eq!(normalize_output(&once), once);
    }

    #[test]
    fn test_escaped_backtick_opens_no_span() {
        assert_eq!(normalize_output("\\`a    b"), "\\`a b");
        assert_eq!(normalize_output("`a\\`  x"), "`a\\` x");
    }
}
