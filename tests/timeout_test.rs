//! Cooperative timeout tests
//!
//! The deadline is only checked at checkpoints, so these tests use either a
//! deadline that has certainly passed or one that certainly has not.

use html_md_converter::engine::{ConversionContext, Engine};
use html_md_converter::{ConversionError, Converter, EngineConfig};
use proptest::prelude::*;
use std::fmt::Write;
use std::time::Duration;

fn large_document(items: usize) -> String {
    let mut html = String::from("<html><body>");
    for i in 0..items {
        let _ = write!(html, "<div><p>Paragraph {i} with <strong>bold</strong> text</p></div>");
    }
    html.push_str("</body></html>");
    html
}

/// A large document under a 1ms deadline fails with Timeout
#[test]
fn test_timeout_on_large_document() {
    let converter = Converter::with_config(EngineConfig {
        timeout_ms: 1,
        ..EngineConfig::default()
    });

    let result = converter.convert(&large_document(20_000));
    assert!(matches!(result, Err(ConversionError::Timeout)), "got {result:?}");
}

/// Zero disables the deadline
#[test]
fn test_zero_timeout_means_unlimited() {
    let converter = Converter::with_config(EngineConfig {
        timeout_ms: 0,
        ..EngineConfig::default()
    });

    let markdown = converter.convert(&large_document(2_000)).expect("no deadline");
    assert!(markdown.starts_with("Paragraph 0 with **bold** text"));
    assert!(markdown.ends_with("Paragraph 1999 with **bold** text"));
}

/// A generous deadline does not interfere with normal documents
#[test]
fn test_generous_timeout_succeeds() {
    let converter = Converter::with_config(EngineConfig {
        timeout_ms: 30_000,
        ..EngineConfig::default()
    });

    let markdown = converter
        .convert("<h1>Title</h1><p>Content</p>")
        .expect("well within deadline");
    assert_eq!(markdown, "# Title\n\nContent");
}

/// Timeout maps to its own error code
#[test]
fn test_timeout_error_code() {
    assert_eq!(ConversionError::Timeout.code(), 3);
    assert_eq!(ConversionError::Timeout.to_string(), "conversion timeout exceeded");
}

/// Node counting stops at the first checkpoint once the deadline has passed
#[test]
fn test_context_checkpoint_after_expiry() {
    let mut ctx = ConversionContext::new(Duration::from_nanos(1));
    std::thread::sleep(Duration::from_millis(2));

    for _ in 0..99 {
        ctx.increment_and_check().expect("no checkpoint yet");
    }
    assert!(matches!(ctx.increment_and_check(), Err(ConversionError::Timeout)));
    assert_eq!(ctx.node_count(), 100);
}

/// Elapsed time is measured from context creation
#[test]
fn test_elapsed_time_tracking() {
    let ctx = ConversionContext::new(Duration::from_secs(10));
    std::thread::sleep(Duration::from_millis(10));
    assert!(ctx.elapsed() >= Duration::from_millis(10));
    assert!(ctx.check_timeout().is_ok());
}

/// Every engine, not only the adapter, honors the configured deadline
#[test]
fn test_bare_engine_timeout() {
    let engine = Engine::new(EngineConfig {
        timeout_ms: 1,
        ..EngineConfig::default()
    });
    assert!(matches!(
        engine.convert_str(&large_document(20_000)),
        Err(ConversionError::Timeout)
    ));
}

proptest! {
    /// The deadline is checked at every 100th node and nowhere else
    #[test]
    fn prop_cooperative_timeout_enforced_at_checkpoints(node_increments in 0u32..220) {
        let mut ctx = ConversionContext::new(Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(1));

        let mut first_err_at: Option<u32> = None;
        for step in 1..=node_increments {
            if ctx.increment_and_check().is_err() {
                first_err_at = Some(step);
                break;
            }
        }

        if node_increments < 100 {
            prop_assert_eq!(first_err_at, None);
        } else {
            prop_assert_eq!(first_err_at, Some(100));
        }
    }
}
