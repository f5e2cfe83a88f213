//! Base configuration of the rendering engine

use std::time::Duration;

use serde::Deserialize;

use crate::security::DEFAULT_MAX_DEPTH;

/// Engine configuration
///
/// Fixed once an engine is built. Every field has a default, so a host can
/// deserialize a partial document:
///
/// ```rust
/// use html_md_converter::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
/// assert_eq!(config.timeout_ms, 250);
/// assert_eq!(config.max_depth, 1000);
/// assert!(config.base_url.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL for resolving relative `href`/`src` values (scheme://host/path)
    pub base_url: Option<String>,
    /// Maximum element nesting depth
    pub max_depth: usize,
    /// Maximum input size in bytes (None means unlimited)
    pub max_input_bytes: Option<usize>,
    /// Cooperative deadline per conversion in milliseconds (0 means none)
    pub timeout_ms: u64,
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_bytes: None,
            timeout_ms: 0,
        }
    }
}
