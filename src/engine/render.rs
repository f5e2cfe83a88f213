//! DOM traversal and the output buffer shared by all rules
//!
//! The renderer walks the tree depth-first in document order. For every
//! element it applies, in order:
//!
//! 1. removal of non-content and unsafe elements ([`SecurityValidator`])
//! 2. the nesting depth limit
//! 3. plugin rules for the tag, most recently registered first
//! 4. the base rules
//!
//! Rules write into a single buffer. Block-level rules separate themselves
//! with blank lines through [`Renderer::start_block`]/[`Renderer::end_block`];
//! rules that need to post-process their content (list items, blockquotes,
//! table cells) render it into a scratch buffer with [`Renderer::capture`].
//!
//! [`SecurityValidator`]: crate::security::SecurityValidator

use std::borrow::Cow;

use markup5ever_rcdom::{Handle, NodeData};

use super::context::ConversionContext;
use super::escape::escape_markdown;
use super::rules;
use super::{Engine, RuleOutcome};
use crate::error::ConversionError;
use crate::security::SanitizeAction;

/// Elements that never contribute content, on top of the security removals
const SKIPPED_ELEMENTS: &[&str] = &["head", "template", "title"];

/// Remaining stack below which rendering moves to a new segment
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// A borrowed view of one element node
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    node: &'a Handle,
    tag: &'a str,
    depth: usize,
}

impl<'a> Element<'a> {
    /// `None` for text, comment and document nodes.
    pub fn new(node: &'a Handle, depth: usize) -> Option<Self> {
        match node.data {
            NodeData::Element { ref name, .. } => Some(Self {
                node,
                tag: name.local.as_ref(),
                depth,
            }),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn node(&self) -> &'a Handle {
        self.node
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        match self.node.data {
            NodeData::Element { ref attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| attr.name.local.as_ref() == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        match self.node.data {
            NodeData::Element { ref attrs, .. } => attrs
                .borrow()
                .iter()
                .any(|attr| attr.name.local.as_ref() == name),
            _ => false,
        }
    }

    /// Whitespace-separated tokens of the `class` attribute
    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|class| class.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Child nodes, cloned so callers can render while iterating.
    pub fn children(&self) -> Vec<Handle> {
        self.node.children.borrow().clone()
    }

    /// First child element with the given tag
    pub fn find_child(&self, tag: &str) -> Option<Handle> {
        self.node
            .children
            .borrow()
            .iter()
            .find(|child| element_tag(child) == Some(tag))
            .cloned()
    }

    /// Concatenated descendant text, `<br>` as a newline.
    ///
    /// Whitespace is kept exactly as in the source, which is what code
    /// blocks need.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(self.node, &mut text);
        text
    }
}

/// Tag name of an element node
pub fn element_tag(node: &Handle) -> Option<&str> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// Walks with an explicit stack, so arbitrarily deep markup cannot exhaust
/// the thread's stack.
fn collect_text(root: &Handle, out: &mut String) {
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        match node.data {
            NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
            NodeData::Element { ref name, .. } => match name.local.as_ref() {
                "br" => out.push('\n'),
                "script" | "style" | "template" => {}
                _ => stack.extend(node.children.borrow().iter().rev().cloned()),
            },
            _ => stack.extend(node.children.borrow().iter().rev().cloned()),
        }
    }
}

/// Renders one document for an [`Engine`]
pub struct Renderer<'e> {
    engine: &'e Engine,
    ctx: ConversionContext,
    out: String,
    /// Number of list items currently being rendered
    list_item_depth: usize,
    /// Number of nested [`Renderer::capture`] calls
    capture_depth: usize,
}

impl<'e> Renderer<'e> {
    pub(crate) fn new(engine: &'e Engine, ctx: ConversionContext) -> Self {
        Self {
            engine,
            ctx,
            out: String::new(),
            list_item_depth: 0,
            capture_depth: 0,
        }
    }

    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    pub(crate) fn into_parts(self) -> (String, ConversionContext) {
        (self.out, self.ctx)
    }

    /// Render any node: elements go through the rule chain, text is
    /// whitespace-collapsed, everything else is ignored.
    ///
    /// Each nesting level recurses. When the current stack runs low the rest
    /// of the subtree is rendered on a freshly allocated segment, so the
    /// depth limit rather than the caller's thread size bounds nesting.
    pub fn render_node(&mut self, node: &Handle, depth: usize) -> Result<(), ConversionError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.render_node_inner(node, depth))
    }

    fn render_node_inner(&mut self, node: &Handle, depth: usize) -> Result<(), ConversionError> {
        self.ctx.increment_and_check()?;

        match node.data {
            NodeData::Document => self.render_child_nodes(node, depth),
            NodeData::Text { ref contents } => {
                self.push_text(&contents.borrow());
                Ok(())
            }
            NodeData::Element { .. } => match Element::new(node, depth) {
                Some(el) => self.render_element(&el),
                None => Ok(()),
            },
            NodeData::Comment { .. }
            | NodeData::Doctype { .. }
            | NodeData::ProcessingInstruction { .. } => Ok(()),
        }
    }

    pub fn render_element(&mut self, el: &Element<'_>) -> Result<(), ConversionError> {
        let engine = self.engine;

        if engine.security().check_element(el.tag()) == SanitizeAction::Remove
            || SKIPPED_ELEMENTS.contains(&el.tag())
        {
            return Ok(());
        }
        engine.security().validate_depth(el.depth())?;

        for rule in engine.rules_for(el.tag()) {
            if rule.render(el, self)? == RuleOutcome::Rendered {
                return Ok(());
            }
        }

        rules::render_base(el, self)
    }

    pub fn render_children(&mut self, el: &Element<'_>) -> Result<(), ConversionError> {
        self.render_child_nodes(el.node(), el.depth())
    }

    fn render_child_nodes(&mut self, node: &Handle, depth: usize) -> Result<(), ConversionError> {
        for child in node.children.borrow().iter() {
            self.render_node(child, depth + 1)?;
        }
        Ok(())
    }

    /// Run `f` against an empty buffer and return what it wrote.
    pub fn capture<F>(&mut self, f: F) -> Result<String, ConversionError>
    where
        F: FnOnce(&mut Self) -> Result<(), ConversionError>,
    {
        let saved = std::mem::take(&mut self.out);
        self.capture_depth += 1;
        let result = f(self);
        self.capture_depth -= 1;
        let captured = std::mem::replace(&mut self.out, saved);
        result.map(|()| captured)
    }

    /// Render `el`'s children as a list item body.
    pub(crate) fn capture_list_item(&mut self, el: &Element<'_>) -> Result<String, ConversionError> {
        self.list_item_depth += 1;
        let result = self.capture(|r| r.render_children(el));
        self.list_item_depth -= 1;
        result
    }

    pub fn push_str(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Append a text node with whitespace collapsed and Markdown escaped.
    ///
    /// A leading or trailing whitespace run becomes a single space, so words
    /// split across inline elements stay separated. Characters Markdown would
    /// read as syntax are backslash-escaped; block markers only where the
    /// text starts a line.
    pub fn push_text(&mut self, text: &str) {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !text.is_empty() {
                self.push_space();
            }
            return;
        }

        if text.starts_with(char::is_whitespace) {
            self.push_space();
        }
        let line_start = self.at_line_start();
        self.out.push_str(&escape_markdown(&collapsed, line_start));
        if text.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    /// Whether the next character begins a line once stray spaces are trimmed
    fn at_line_start(&self) -> bool {
        let trimmed = self.out.trim_end_matches(' ');
        trimmed.is_empty() || trimmed.ends_with('\n')
    }

    /// A single space, unless the buffer already ends with whitespace.
    ///
    /// At the very start of the document a space is meaningless and would
    /// read as indentation, so it is dropped. Inside a capture it is kept for
    /// the caller to move outside its markers.
    pub fn push_space(&mut self) {
        if self.out.ends_with(char::is_whitespace)
            || (self.out.is_empty() && self.capture_depth == 0)
        {
            return;
        }
        self.out.push(' ');
    }

    /// Hard line break
    pub fn push_line_break(&mut self) {
        self.trim_trailing_spaces();
        self.out.push('\n');
    }

    /// Separate what follows from preceding content with a blank line.
    pub fn start_block(&mut self) {
        self.trim_trailing_spaces();
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    pub fn end_block(&mut self) {
        self.start_block();
    }

    /// Like [`start_block`](Self::start_block), but a list nested inside a
    /// list item only starts a new line so the outer list stays tight.
    pub(crate) fn start_list(&mut self) {
        if self.list_item_depth == 0 {
            self.start_block();
            return;
        }
        self.trim_trailing_spaces();
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    pub(crate) fn end_list(&mut self) {
        if self.list_item_depth == 0 {
            self.end_block();
        } else {
            self.out.push('\n');
        }
    }

    fn trim_trailing_spaces(&mut self) {
        let end = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(end);
    }

    /// Render `el`'s children between `marker`s, e.g. `**bold**`.
    ///
    /// Whitespace at the edges of the content is moved outside the markers,
    /// and an element with no visible content produces nothing.
    pub fn wrap_inline(&mut self, el: &Element<'_>, marker: &str) -> Result<(), ConversionError> {
        let inner = self.capture(|r| r.render_children(el))?;
        self.push_wrapped(&inner, marker, marker);
        Ok(())
    }

    /// Push `inner` between `open` and `close` with edge whitespace moved out.
    pub fn push_wrapped(&mut self, inner: &str, open: &str, close: &str) {
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            if !inner.is_empty() {
                self.push_space();
            }
            return;
        }

        if inner.starts_with(char::is_whitespace) {
            self.push_space();
        }
        self.out.push_str(open);
        self.out.push_str(trimmed);
        self.out.push_str(close);
        if inner.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    /// Emit a fenced code block.
    pub fn push_fenced_block(&mut self, fence: &str, language: &str, code: &str) {
        self.start_block();
        self.out.push_str(fence);
        self.out.push_str(language);
        self.out.push('\n');
        if !code.is_empty() {
            self.out.push_str(code);
            self.out.push('\n');
        }
        self.out.push_str(fence);
        self.end_block();
    }

    /// Sanitize and resolve a link or image target.
    ///
    /// `None` means the URL must not be emitted.
    pub fn resolve_url<'u>(&self, url: &'u str) -> Option<Cow<'u, str>> {
        let url = self.engine.security().sanitize_url(url)?;
        Some(self.engine.links().resolve(url))
    }
}
