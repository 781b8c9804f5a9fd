// src/crawl/classify.rs
// =============================================================================
// Decides what to do with a single <a href="..."> value.
//
// Rules, checked in order:
// 1. No href (or an empty one)           -> discard
// 2. "#" or "#something" (page anchors)  -> discard
// 3. "//host/path" (protocol-relative)   -> origin's scheme + href, kept
//                                           only when the host matches
// 4. Absolute URL on the origin's host   -> keep it exactly as written
// 5. Contains "http://" or "https://"    -> discard (external site)
// 6. Anything else                       -> keep origin + href
//
// Rule 6 is plain string concatenation. "../docs" becomes
// "https://example.com../docs"; we don't resolve path segments.
//
// Host comparison ignores scheme and port, so "http://example.com:8080/x"
// counts as same-domain for an https://example.com origin.
// =============================================================================

use std::fmt;
use url::Url;

/// The scheme://host[:port] the seed page was served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    serialized: String,
    scheme: String,
    host: String,
}

impl Origin {
    // The port is only included when it isn't the scheme's default,
    // so https://example.com:443/ becomes "https://example.com"
    pub fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        let serialized = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };
        Some(Self {
            serialized,
            scheme: url.scheme().to_string(),
            host,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn as_str(&self) -> &str {
        &self.serialized
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    MissingHref,
    PageAnchor,
    External,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiscardReason::MissingHref => "no href found",
            DiscardReason::PageAnchor => "href was a # anchor tag",
            DiscardReason::External => "external url detected",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A URL to add to the frontier
    Keep(String),
    Discard(DiscardReason),
}

pub fn classify(raw_href: Option<&str>, origin: &Origin) -> Classification {
    let href = match raw_href {
        Some(href) if !href.is_empty() => href,
        _ => return Classification::Discard(DiscardReason::MissingHref),
    };

    if href.starts_with('#') {
        return Classification::Discard(DiscardReason::PageAnchor);
    }

    if let Some(rest) = href.strip_prefix("//") {
        let absolute = format!("{}://{}", origin.scheme(), rest);
        return if is_same_host(&absolute, origin) {
            Classification::Keep(absolute)
        } else {
            Classification::Discard(DiscardReason::External)
        };
    }

    if is_same_host(href, origin) {
        return Classification::Keep(href.to_string());
    }

    if href.contains("http://") || href.contains("https://") {
        return Classification::Discard(DiscardReason::External);
    }

    Classification::Keep(format!("{}{}", origin, href))
}

// True when href parses as an absolute URL whose host is the origin's host.
// Relative hrefs fail to parse on their own, so they're never same-host here.
fn is_same_host(href: &str, origin: &Origin) -> bool {
    Url::parse(href)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.eq_ignore_ascii_case(origin.host())))
        .unwrap_or(false)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why return an enum instead of Option<String>?
//    - The collector logs *why* a link was dropped, so a discard carries
//      its reason (DiscardReason) rather than a bare None
//    - match on Classification forces callers to handle both cases
//
// 2. What does Option<&str> buy us over &str?
//    - <a> tags without an href give scraper's attr() a None; taking the
//      Option directly means "missing" and "empty" share one rule
//
// 3. Why not url.join() for relative links?
//    - join() resolves "../" like a browser; we deliberately glue the
//      origin and href together instead, so the output is predictable
//
// 4. strip_prefix vs starts_with:
//    - strip_prefix("//") returns Some(rest) with the prefix removed, so
//      the check and the slicing happen in one step
// -----------------------------------------------------------------------------
