//! Code block handling that tolerates real-world markup
//!
//! Syntax highlighters, documentation generators and copy-pasted snippets
//! produce `<pre>` blocks the base rule mangles: backtick runs that close a
//! triple fence early, `<br>` line breaks, `<span>` per token, line-number
//! gutters mixed into the text, nested `<pre>`/`<code>` pairs. This plugin
//! extracts the code text from all of those shapes and picks a fence that the
//! content cannot terminate.

use html5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData};

use crate::engine::{Element, Plugin, Renderer, Rule, RuleOutcome, element_tag, longest_backtick_run};
use crate::error::ConversionError;

/// Class prefixes carrying the language name, most specific first
const LANGUAGE_PREFIXES: &[&str] = &["language-", "lang-", "highlight-source-", "highlight-"];

/// Class fragments marking line-number gutters
const GUTTER_MARKERS: &[&str] = &["lineno", "line-number", "gutter"];

/// Elements that end a line of code
const LINE_ELEMENTS: &[&str] = &["div", "p", "li", "tr", "pre"];

/// Fenced code blocks robust to messy markup
///
/// ```rust
/// use html_md_converter::engine::Engine;
/// use html_md_converter::plugins::RobustCodeBlock;
///
/// let mut engine = Engine::default();
/// engine.use_plugin(RobustCodeBlock);
///
/// let markdown = engine.convert_str("<pre>```\nnested fence\n```</pre>")?;
/// assert_eq!(markdown, "````\n```\nnested fence\n```\n````");
/// # Ok::<(), html_md_converter::ConversionError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustCodeBlock;

impl RobustCodeBlock {
    pub const NAME: &'static str = "robust-code-block";
}

impl Plugin for RobustCodeBlock {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rules(&self) -> Vec<Box<dyn Rule>> {
        vec![Box::new(CodeBlockRule)]
    }
}

struct CodeBlockRule;

impl Rule for CodeBlockRule {
    fn tags(&self) -> &'static [&'static str] {
        &["pre", "code"]
    }

    fn render(&self, el: &Element<'_>, r: &mut Renderer<'_>) -> Result<RuleOutcome, ConversionError> {
        // Single-line <code> outside <pre> stays an inline code span
        if el.tag() == "code" && !is_multiline_code(el) {
            return Ok(RuleOutcome::Declined);
        }

        let mut text = String::new();
        collect_code(el.node(), &mut text);
        let code = trim_blank_lines(&text);
        let language = detect_language(el).unwrap_or_default();
        let fence = "`".repeat((longest_backtick_run(&code) + 1).max(3));

        r.push_fenced_block(&fence, &language, &code);
        Ok(RuleOutcome::Rendered)
    }
}

fn is_multiline_code(el: &Element<'_>) -> bool {
    el.text_content().contains('\n') || contains_element(el.node(), "pre")
}

fn contains_element(node: &Handle, tag: &str) -> bool {
    let mut stack: Vec<Handle> = node.children.borrow().clone();
    while let Some(current) = stack.pop() {
        if element_tag(&current) == Some(tag) {
            return true;
        }
        stack.extend(current.children.borrow().iter().cloned());
    }
    false
}

/// Pending work while extracting code text
enum Step {
    Visit { node: Handle, root: bool },
    /// Close the line opened by a line element
    EndLine,
}

/// Append the code text under `root`.
///
/// Gutter detection applies to descendants only, never to the `<pre>` or
/// `<code>` being rendered. The walk keeps its own stack, so nesting depth
/// does not matter.
fn collect_code(root: &Handle, out: &mut String) {
    let mut stack = vec![Step::Visit {
        node: root.clone(),
        root: true,
    }];

    while let Some(step) = stack.pop() {
        let (node, is_root) = match step {
            Step::EndLine => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                continue;
            }
            Step::Visit { node, root } => (node, root),
        };

        match node.data {
            NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
            NodeData::Element { ref name, ref attrs, .. } => {
                let tag = name.local.as_ref();
                match tag {
                    "br" => {
                        out.push('\n');
                        continue;
                    }
                    "script" | "style" | "template" | "button" => continue,
                    _ => {}
                }
                if !is_root {
                    if is_gutter(&attrs.borrow()) {
                        continue;
                    }
                    if LINE_ELEMENTS.contains(&tag) {
                        stack.push(Step::EndLine);
                    }
                }
                stack.extend(node.children.borrow().iter().rev().map(|child| Step::Visit {
                    node: child.clone(),
                    root: false,
                }));
            }
            _ => {}
        }
    }
}

fn is_gutter(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| match attr.name.local.as_ref() {
        "class" => attr
            .value
            .split_whitespace()
            .any(|class| GUTTER_MARKERS.iter().any(|m| class.contains(m))),
        "data-line-number" => true,
        _ => false,
    })
}

/// Drop whitespace-only lines at both ends, keeping indentation of the rest.
fn trim_blank_lines(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let lines: Vec<&str> = text.split('\n').collect();
    let start = lines.iter().position(|line| !line.trim().is_empty());
    let end = lines.iter().rposition(|line| !line.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Language name from the element, its `<code>` descendants, or a
/// highlighter wrapper around it.
fn detect_language(el: &Element<'_>) -> Option<String> {
    language_of(el.node())
        .or_else(|| first_descendant(el.node(), "code").and_then(|code| language_of(&code)))
        .or_else(|| parent(el.node()).and_then(|wrapper| language_of(&wrapper)))
}

fn language_of(node: &Handle) -> Option<String> {
    let NodeData::Element { ref attrs, .. } = node.data else {
        return None;
    };
    let attrs = attrs.borrow();

    let from_class = attrs
        .iter()
        .filter(|attr| attr.name.local.as_ref() == "class")
        .flat_map(|attr| attr.value.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .find_map(|class| {
            LANGUAGE_PREFIXES
                .iter()
                .find_map(|prefix| class.strip_prefix(prefix).and_then(sanitize_language))
        });

    from_class.or_else(|| {
        attrs
            .iter()
            .filter(|attr| matches!(attr.name.local.as_ref(), "data-lang" | "data-language"))
            .find_map(|attr| sanitize_language(&attr.value))
    })
}

/// Keep characters valid in a fence info string; `None` if nothing is left.
fn sanitize_language(raw: &str) -> Option<String> {
    let language: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '#' | '_' | '.'))
        .collect();
    (!language.is_empty()).then_some(language)
}

/// First descendant element with `tag`, in document order
fn first_descendant(node: &Handle, tag: &str) -> Option<Handle> {
    let mut stack: Vec<Handle> = node.children.borrow().iter().rev().cloned().collect();
    while let Some(current) = stack.pop() {
        if element_tag(&current) == Some(tag) {
            return Some(current);
        }
        stack.extend(current.children.borrow().iter().rev().cloned());
    }
    None
}

/// Parent element, if any
fn parent(node: &Handle) -> Option<Handle> {
    // The parent link is a Cell, so it has to be taken out and put back
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|weak| weak.upgrade());
    node.parent.set(weak);
    parent.filter(|p| matches!(p.data, NodeData::Element { .. }))
}
