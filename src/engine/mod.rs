//! HTML to Markdown rendering engine
//!
//! An [`Engine`] owns an immutable [`EngineConfig`], a fixed set of base
//! CommonMark rules and an ordered list of plugin rules. Plugins are named
//! bundles of [`Rule`]s registered with [`Engine::use_plugin`]; a rule
//! claims elements by tag and either renders them or declines, passing them
//! on down the chain:
//!
//! ```text
//! element ─▶ last plugin's rules ─▶ … ─▶ first plugin's rules ─▶ base rules
//! ```
//!
//! Conversion is a three-stage pipeline (parse, render, normalize), each
//! stage bounded by the cooperative deadline in [`ConversionContext`].
//!
//! # Example
//!
//! ```rust
//! use html_md_converter::engine::{Engine, EngineConfig};
//! use html_md_converter::plugins::GitHubFlavored;
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.use_plugin(GitHubFlavored);
//!
//! let markdown = engine.convert_str("<p>Hello <del>old</del> world</p>")?;
//! assert_eq!(markdown, "Hello ~~old~~ world");
//! # Ok::<(), html_md_converter::ConversionError>(())
//! ```

mod config;
mod context;
mod escape;
mod normalize;
mod render;
mod rules;

pub use config::EngineConfig;
pub use context::ConversionContext;
pub use escape::escape_markdown;
pub use normalize::normalize_output;
pub use render::{Element, Renderer, element_tag};
pub use rules::longest_backtick_run;

use markup5ever_rcdom::RcDom;
use tracing::trace;

use crate::error::ConversionError;
use crate::links::LinkResolver;
use crate::parser;
use crate::security::SecurityValidator;

/// Result of offering an element to a [`Rule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule wrote the element's Markdown
    Rendered,
    /// The rule does not handle this element; try the next one
    Declined,
}

/// Renders one kind of element
pub trait Rule: Send + Sync {
    /// Tags this rule is offered
    fn tags(&self) -> &'static [&'static str];

    fn render(
        &self,
        el: &Element<'_>,
        renderer: &mut Renderer<'_>,
    ) -> Result<RuleOutcome, ConversionError>;
}

/// A named bundle of rules
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn rules(&self) -> Vec<Box<dyn Rule>>;
}

struct RegisteredRule {
    plugin: &'static str,
    rule: Box<dyn Rule>,
}

/// Configured HTML to Markdown engine
pub struct Engine {
    config: EngineConfig,
    security: SecurityValidator,
    links: LinkResolver,
    rules: Vec<RegisteredRule>,
    plugins: Vec<&'static str>,
}

impl Engine {
    /// Engine with the base rules only.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            security: SecurityValidator::with_max_depth(config.max_depth),
            links: LinkResolver::new(config.base_url.as_deref()),
            config,
            rules: Vec::new(),
            plugins: Vec::new(),
        }
    }

    /// Register a plugin. Its rules take precedence over the base rules and
    /// over rules of plugins registered before it.
    pub fn use_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        let name = plugin.name();
        for rule in plugin.rules() {
            trace!(plugin = name, tags = ?rule.tags(), "registered rule");
            self.rules.push(RegisteredRule { plugin: name, rule });
        }
        self.plugins.push(name);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of registered plugins, in registration order
    pub fn plugins(&self) -> &[&'static str] {
        &self.plugins
    }

    pub fn security(&self) -> &SecurityValidator {
        &self.security
    }

    pub fn links(&self) -> &LinkResolver {
        &self.links
    }

    /// Plugin rules offered `tag`, highest precedence first
    fn rules_for<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a dyn Rule> + 'a {
        self.rules
            .iter()
            .rev()
            .filter(move |registered| registered.rule.tags().contains(&tag))
            .map(|registered| registered.rule.as_ref())
    }

    /// Names of the plugins contributing a rule for `tag`, highest precedence first
    pub fn plugins_for(&self, tag: &str) -> Vec<&'static str> {
        self.rules
            .iter()
            .rev()
            .filter(|registered| registered.rule.tags().contains(&tag))
            .map(|registered| registered.plugin)
            .collect()
    }

    /// Convert UTF-8 HTML.
    pub fn convert_str(&self, html: &str) -> Result<String, ConversionError> {
        self.check_size(html.len())?;
        let ctx = ConversionContext::new(self.config.timeout());
        let dom = parser::parse_str(html);
        ctx.check_timeout()?;
        self.render(&dom, ctx)
    }

    /// Convert raw bytes, detecting their charset first.
    pub fn convert_bytes(
        &self,
        html: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, ConversionError> {
        self.check_size(html.len())?;
        let ctx = ConversionContext::new(self.config.timeout());
        let dom = parser::parse_bytes(html, content_type)?;
        ctx.check_timeout()?;
        self.render(&dom, ctx)
    }

    /// Convert an already parsed document.
    pub fn convert_dom(&self, dom: &RcDom) -> Result<String, ConversionError> {
        self.render(dom, ConversionContext::new(self.config.timeout()))
    }

    fn check_size(&self, size: usize) -> Result<(), ConversionError> {
        match self.config.max_input_bytes {
            Some(limit) if size > limit => Err(ConversionError::InputTooLarge { size, limit }),
            _ => Ok(()),
        }
    }

    fn render(&self, dom: &RcDom, ctx: ConversionContext) -> Result<String, ConversionError> {
        let mut renderer = Renderer::new(self, ctx);
        renderer.render_node(&dom.document, 0)?;
        let (raw, ctx) = renderer.into_parts();
        ctx.check_timeout()?;

        let markdown = normalize_output(&raw);
        ctx.check_timeout()?;
        trace!(
            nodes = ctx.node_count(),
            elapsed_us = ctx.elapsed().as_micros() as u64,
            "rendered document"
        );
        Ok(markdown)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .field("rules", &self.rules.len())
            .finish()
    }
}
