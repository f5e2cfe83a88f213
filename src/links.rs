//! Relative URL resolution for link and image targets
//!
//! When the engine is configured with a base URL, relative `href`/`src`
//! values are made absolute against it. Without one (the default), URLs pass
//! through untouched.

use std::borrow::Cow;

use url::Url;

/// Resolves relative URLs against an optional `http(s)` base.
#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    base: Option<Url>,
}

impl LinkResolver {
    /// A base that is not an absolute `http`/`https` URL is ignored.
    pub fn new(base_url: Option<&str>) -> Self {
        let base = base_url
            .and_then(|raw| Url::parse(raw.trim()).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
        Self { base }
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Absolute form of `url`, or `url` itself when it is already absolute,
    /// a fragment, or cannot be joined.
    ///
    /// ```
    /// use html_md_converter::links::LinkResolver;
    ///
    /// let resolver = LinkResolver::new(Some("https://example.com/docs/page"));
    /// assert_eq!(resolver.resolve("/img.png"), "https://example.com/img.png");
    /// assert_eq!(resolver.resolve("../up.html"), "https://example.com/up.html");
    /// assert_eq!(resolver.resolve("#top"), "#top");
    /// ```
    pub fn resolve<'a>(&self, url: &'a str) -> Cow<'a, str> {
        let Some(base) = &self.base else {
            return Cow::Borrowed(url);
        };
        if url.is_empty() || url.starts_with('#') || has_scheme(url) {
            return Cow::Borrowed(url);
        }
        match base.join(url) {
            Ok(joined) => Cow::Owned(joined.into()),
            Err(_) => Cow::Borrowed(url),
        }
    }
}

/// `mailto:`, `https:`, `tel:` and friends are left alone
fn has_scheme(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return false;
    };
    let scheme = &url[..colon];
    !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
