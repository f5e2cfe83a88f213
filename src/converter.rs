//! HTML to Markdown conversion adapter
//!
//! [`Converter`] is the entry point most callers need. It builds one
//! [`Engine`] with a fixed base configuration and the two plugins below, then
//! forwards every conversion to it unchanged:
//!
//! 1. [`GitHubFlavored`]: pipe tables, strikethrough, task lists
//! 2. [`RobustCodeBlock`]: fences that survive backticks and messy `<pre>`
//!
//! The configuration never changes after construction and every method takes
//! `&self`, so one converter can serve any number of threads at once. Each
//! call parses its own DOM and shares nothing else.
//!
//! # Examples
//!
//! ```rust
//! use html_md_converter::Converter;
//!
//! let converter = Converter::new();
//! let markdown = converter.convert("<h1>Title</h1><p>Hello <strong>world</strong></p>")?;
//! assert_eq!(markdown, "# Title\n\nHello **world**");
//! # Ok::<(), html_md_converter::ConversionError>(())
//! ```
//!
//! Hosts holding raw response bytes let the engine pick the charset:
//!
//! ```rust
//! use html_md_converter::Converter;
//!
//! let converter = Converter::new();
//! let markdown = converter.convert_bytes(b"<p>Caf\xE9</p>", Some("text/html; charset=latin1"))?;
//! assert_eq!(markdown, "Café");
//! # Ok::<(), html_md_converter::ConversionError>(())
//! ```

use std::time::Instant;

use tracing::{debug, warn};

use crate::engine::{Engine, EngineConfig};
use crate::error::ConversionError;
use crate::plugins::{GitHubFlavored, RobustCodeBlock};

/// Configured HTML to Markdown converter
#[derive(Debug)]
pub struct Converter {
    engine: Engine,
}

impl Converter {
    /// Converter with the default engine configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Converter over a caller-supplied base configuration.
    ///
    /// ```rust
    /// use html_md_converter::{Converter, EngineConfig};
    ///
    /// let converter = Converter::with_config(EngineConfig {
    ///     base_url: Some("https://example.com/blog/".to_string()),
    ///     ..EngineConfig::default()
    /// });
    /// assert_eq!(
    ///     converter.convert(r#"<a href="post.html">Post</a>"#).unwrap(),
    ///     "[Post](https://example.com/blog/post.html)"
    /// );
    /// ```
    pub fn with_config(config: EngineConfig) -> Self {
        let mut engine = Engine::new(config);
        engine.use_plugin(GitHubFlavored).use_plugin(RobustCodeBlock);
        debug!(plugins = ?engine.plugins(), config = ?engine.config(), "converter ready");
        Self { engine }
    }

    /// Convert an HTML document or fragment to Markdown.
    ///
    /// The input does not need to be well-formed; it is repaired the way a
    /// browser would repair it. Errors come from the engine unchanged.
    pub fn convert(&self, html: &str) -> Result<String, ConversionError> {
        let start = Instant::now();
        let result = self.engine.convert_str(html);
        self.log_outcome(html.len(), start, &result);
        result
    }

    /// Convert raw HTML bytes, using `content_type` and `<meta>` to find
    /// their charset.
    pub fn convert_bytes(
        &self,
        html: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, ConversionError> {
        let start = Instant::now();
        let result = self.engine.convert_bytes(html, content_type);
        self.log_outcome(html.len(), start, &result);
        result
    }

    /// Registered plugin names, in registration order
    pub fn plugins(&self) -> &[&'static str] {
        self.engine.plugins()
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    fn log_outcome(&self, input_bytes: usize, start: Instant, result: &Result<String, ConversionError>) {
        let elapsed_us = start.elapsed().as_micros() as u64;
        match result {
            Ok(markdown) => debug!(
                input_bytes,
                output_bytes = markdown.len(),
                elapsed_us,
                "converted html to markdown"
            ),
            Err(err) => warn!(
                input_bytes,
                code = err.code(),
                error = %err,
                elapsed_us,
                "html to markdown conversion failed"
            ),
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use proptest::prelude::*;

    static_assertions::assert_impl_all!(Converter: Send, Sync);

    fn convert(html: &str) -> String {
        Converter::new().convert(html).expect("conversion succeeds")
    }

    #[test]
    fn test_plugins_registered_in_order() {
        assert_eq!(Converter::new().plugins(), ["github-flavored", "robust-code-block"]);
        assert_eq!(Converter::default().config(), &EngineConfig::default());
    }

    #[test]
    fn test_heading_and_paragraph() {
        let markdown = convert("<h1>Title</h1><p>Hello <strong>world</strong></p>");
        assert!(markdown.lines().any(|line| line == "# Title"));
        assert!(markdown.lines().any(|line| line == "Hello **world**"));
        assert_eq!(markdown, "# Title\n\nHello **world**");
    }

    #[test]
    fn test_simple_paragraph() {
        assert_eq!(convert("<p>Hello, world!</p>"), "Hello, world!");
    }

    #[test]
    fn test_nested_elements() {
        assert_eq!(
            convert("<div><p>Hello <b>bold</b> world!</p><ul><li>List item</li></ul></div>"),
            "Hello **bold** world!\n\n- List item"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(convert(""), "");
    }

    #[test]
    fn test_invalid_html_degrades_gracefully() {
        let cases = [
            ("<html><p>Unclosed tag", "Unclosed tag"),
            ("<div><span>Missing closing div", "Missing closing div"),
            ("<p><strong>Wrong nesting</em></strong></p>", "**Wrong nesting**"),
            (
                r#"<a href="http://example.com">Link without closing tag"#,
                "[Link without closing tag](http://example.com)",
            ),
        ];
        for (html, expected) in cases {
            assert_eq!(convert(html), expected, "input: {html}");
        }
    }

    #[test]
    fn test_gfm_table() {
        let html = indoc! {"
            <table>
              <thead><tr><th>Feature</th><th>Status</th></tr></thead>
              <tbody><tr><td>Tables</td><td>Done</td></tr></tbody>
            </table>
        "};
        assert_eq!(
            convert(html),
            "| Feature | Status |\n| --- | --- |\n| Tables | Done |"
        );
    }

    #[test]
    fn test_malformed_pre_code() {
        let cases = [
            "<pre><code>unclosed",
            "<code><pre>inverted</pre></code>",
            "<pre><code><pre><code>double</code></pre></code></pre>",
            "<pre></code>stray end tag</pre>",
            "<pre><code class=\"language-\">``` fence inside ```</code></pre>",
        ];
        for html in cases {
            let markdown = Converter::new().convert(html);
            assert!(markdown.is_ok(), "input: {html}");
        }
        assert_eq!(convert("<pre><code>unclosed"), "```\nunclosed\n```");
    }

    #[test]
    fn test_select_options() {
        let html = indoc! {r#"
            <div>
              <select>
                <option value="1">A</option>
                <option value="2">B</option>
              </select>
              <select>
                <option value="">Choose</option>
                <option value="3">C</option>
                <option value="4" disabled>D</option>
              </select>
            </div>
        "#};
        let markdown = convert(html);
        assert!(markdown.contains("A, B"));
        assert!(markdown.contains('C'));
        assert!(!markdown.contains("Choose"));
        assert!(!markdown.contains('D'));
    }

    #[test]
    fn test_two_instances_agree() {
        let html = "<h2>Docs</h2><pre><code class=\"language-sh\">echo `date`</code></pre><p><del>old</del> new</p>";
        assert_eq!(
            Converter::new().convert(html).unwrap(),
            Converter::new().convert(html).unwrap()
        );
    }

    #[test]
    fn test_error_propagated_unchanged() {
        let converter = Converter::with_config(EngineConfig {
            max_input_bytes: Some(4),
            ..EngineConfig::default()
        });
        assert!(matches!(
            converter.convert("<p>long</p>"),
            Err(ConversionError::InputTooLarge { size: 11, limit: 4 })
        ));
        assert!(matches!(
            converter.convert_bytes(b"<p>long</p>", None),
            Err(ConversionError::InputTooLarge { .. })
        ));
    }

    #[test]
    fn test_convert_bytes_rejects_invalid_encoding() {
        let result = Converter::new().convert_bytes(b"<p>\xFF\xFE</p>", Some("text/html; charset=utf-8"));
        assert!(matches!(result, Err(ConversionError::Encoding(_))));
    }

    proptest! {
        #[test]
        fn prop_deterministic_output(
            tag in prop::sample::select(vec!["p", "h1", "h3", "li", "td", "pre", "code", "em", "del"]),
            text in "[a-zA-Z0-9 `|*_<>&]{0,40}",
        ) {
            let html = format!("<{tag}>{text}</{tag}>");
            let converter = Converter::new();
            let first = converter.convert(&html);
            let second = converter.convert(&html);
            prop_assert!(first.is_ok());
            prop_assert_eq!(first.ok(), second.ok());
        }

        #[test]
        fn prop_arbitrary_text_never_fails(input in "\\PC{0,200}") {
            prop_assert!(Converter::new().convert(&input).is_ok());
        }
    }
}
