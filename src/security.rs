//! Sanitization applied while rendering untrusted HTML
//!
//! The engine never copies raw markup into its output, so attribute-level
//! attacks (event handlers, inline styles) cannot survive conversion. What
//! can survive is text and URLs, which is what this module polices:
//!
//! 1. **Element removal**: executable or embedding elements are dropped together
//!    with their children, so their text never reaches the Markdown.
//! 2. **URL schemes**: `javascript:`, `data:`, `vbscript:`, `file:` and `about:`
//!    targets are refused for links and images.
//! 3. **Nesting depth**: documents nested deeper than the configured limit are
//!    rejected before the recursive renderer can exhaust the stack.
//!
//! html5ever does not resolve external entities, so XXE is not a concern.

use crate::error::ConversionError;

/// Default maximum element nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Elements removed together with their children
const REMOVED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "object", "embed", "applet", "link", "base",
];

/// URL schemes never emitted as link or image targets
const DANGEROUS_URL_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:", "file:", "about:"];

/// What to do with an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeAction {
    /// Render the element normally
    Allow,
    /// Drop the element and all its children
    Remove,
}

/// Security checks used by the rendering engine
#[derive(Debug, Clone)]
pub struct SecurityValidator {
    max_depth: usize,
}

impl SecurityValidator {
    /// Validator with the default depth limit
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Validator with a custom depth limit
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// ```
    /// use html_md_converter::security::{SanitizeAction, SecurityValidator};
    ///
    /// let validator = SecurityValidator::new();
    /// assert_eq!(validator.check_element("script"), SanitizeAction::Remove);
    /// assert_eq!(validator.check_element("div"), SanitizeAction::Allow);
    /// ```
    pub fn check_element(&self, tag_name: &str) -> SanitizeAction {
        if REMOVED_ELEMENTS.contains(&tag_name) {
            SanitizeAction::Remove
        } else {
            SanitizeAction::Allow
        }
    }

    /// Whether `url` uses a blocked scheme (case-insensitive, leading whitespace ignored)
    pub fn is_dangerous_url(&self, url: &str) -> bool {
        let url = url.trim_start();
        DANGEROUS_URL_SCHEMES.iter().any(|scheme| {
            url.get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        })
    }

    /// Return the trimmed URL if it is safe to emit.
    ///
    /// ```
    /// use html_md_converter::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::new();
    /// assert_eq!(validator.sanitize_url("javascript:alert(1)"), None);
    /// assert_eq!(validator.sanitize_url(" /docs "), Some("/docs"));
    /// ```
    pub fn sanitize_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        if self.is_dangerous_url(url) {
            None
        } else {
            Some(url.trim())
        }
    }

    /// Reject elements nested deeper than the limit.
    pub fn validate_depth(&self, depth: usize) -> Result<(), ConversionError> {
        if depth > self.max_depth {
            return Err(ConversionError::InvalidInput(format!(
                "HTML nesting depth {depth} exceeds maximum allowed depth {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for SecurityValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_removed_elements() {
        let validator = SecurityValidator::new();
        for tag in ["script", "style", "iframe", "object", "embed", "noscript"] {
            assert_eq!(validator.check_element(tag), SanitizeAction::Remove, "{tag}");
        }
        for tag in ["div", "p", "a", "pre", "table"] {
            assert_eq!(validator.check_element(tag), SanitizeAction::Allow, "{tag}");
        }
    }

    #[test]
    fn test_dangerous_urls() {
        let validator = SecurityValidator::new();

        assert!(validator.is_dangerous_url("javascript:alert('xss')"));
        assert!(validator.is_dangerous_url("JavaScript:alert('xss')"));
        assert!(validator.is_dangerous_url("data:text/html,<script>alert('xss')</script>"));
        assert!(validator.is_dangerous_url("vbscript:msgbox('xss')"));
        assert!(validator.is_dangerous_url("file:///etc/passwd"));

        assert!(!validator.is_dangerous_url("https://example.com"));
        assert!(!validator.is_dangerous_url("/relative/path"));
        assert!(!validator.is_dangerous_url("../parent/path"));
        assert!(!validator.is_dangerous_url("#anchor"));
        assert!(!validator.is_dangerous_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_dangerous_url_with_multibyte_prefix() {
        // must not slice inside a UTF-8 sequence
        let validator = SecurityValidator::new();
        assert!(!validator.is_dangerous_url("日本語"));
    }

    #[test]
    fn test_depth_validation() {
        let validator = SecurityValidator::with_max_depth(100);

        assert!(validator.validate_depth(100).is_ok());
        match validator.validate_depth(101) {
            Err(ConversionError::InvalidInput(message)) => assert!(message.contains("101")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_dangerous_schemes_rejected(
            leading_ws in "[ \\t\\n\\r]{0,3}",
            payload in "[A-Za-z0-9_/?=&:%#.-]{0,64}",
            uppercase in any::<bool>(),
        ) {
            let validator = SecurityValidator::new();
            for scheme in DANGEROUS_URL_SCHEMES {
                let scheme = if uppercase { scheme.to_uppercase() } else { scheme.to_string() };
                let candidate = format!("{leading_ws}{scheme}{payload}");
                prop_assert!(validator.is_dangerous_url(&candidate), "{}", candidate);
                prop_assert_eq!(validator.sanitize_url(&candidate), None);
            }
        }
    }
}
