//! HTML to Markdown conversion
//!
//! This library turns arbitrary, possibly malformed HTML into clean Markdown.
//! Most callers only need [`Converter`], which builds a rendering engine once
//! with GitHub-flavored extensions and robust code-block handling and then
//! converts any number of documents, from any number of threads.
//!
//! # Architecture
//!
//! - `converter`: the adapter, a fixed engine configuration behind `convert`
//! - `engine`: base CommonMark rules, plugin registry and output normalization
//! - `plugins`: GitHub-flavored Markdown and robust code blocks
//! - `parser`: HTML5 parsing using html5ever
//! - `charset`: character encoding detection for byte input
//! - `security`: element removal, URL scheme blocking, nesting limit
//! - `links`: relative URL resolution against a base URL
//! - `ffi`: C ABI for non-Rust hosts
//!
//! # Example
//!
//! ```rust
//! use html_md_converter::Converter;
//!
//! let converter = Converter::new();
//! let markdown = converter.convert("<p>Hello, <em>world</em>!</p>")?;
//! assert_eq!(markdown, "Hello, *world*!");
//! # Ok::<(), html_md_converter::ConversionError>(())
//! ```
//!
//! # Logging
//!
//! The library emits `tracing` events and never installs a subscriber; that
//! is left to the host application.

pub mod charset;
pub mod converter;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod links;
pub mod parser;
pub mod plugins;
pub mod security;

pub use converter::Converter;
pub use engine::{Engine, EngineConfig, Plugin, Rule, RuleOutcome};
pub use error::ConversionError;
pub use ffi::HtmlMdResult;
