// src/crawl/collect.rs
// =============================================================================
// Walks the anchors of an already-fetched page and builds the frontier.
//
// The frontier is an ordered set: each URL appears once, in the order it
// was first seen on the page. A Vec keeps the order and a HashSet makes
// the "seen it already?" check O(1).
//
// Nothing here touches the network - fetching happens in fetch.rs.
// =============================================================================

use super::classify::{classify, Classification, Origin};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL unless it's already present. Returns true if it was added.
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }

    /// Comma-joined, the form the batch audit tool takes with `-s`.
    pub fn to_csv(&self) -> String {
        self.urls.join(",")
    }
}

/// The frontier plus how many anchors produced a kept URL (duplicates included).
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub frontier: Frontier,
    pub kept: usize,
}

pub fn collect_links(document: &Html, origin: &Origin) -> Collection {
    // "a" is a constant selector known to be valid, so this can't fail
    let selector = Selector::parse("a").unwrap();

    let mut collection = Collection::default();

    for element in document.select(&selector) {
        let href = element.value().attr("href");

        match classify(href, origin) {
            Classification::Keep(url) => {
                debug!("Parse href: keeping {}", url);
                collection.frontier.insert(url);
                collection.kept += 1;
            }
            Classification::Discard(reason) => {
                debug!("Parse href: {}. skipping: {}", reason, href.unwrap_or(""));
            }
        }
    }

    collection
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why both a Vec and a HashSet?
//    - HashSet alone forgets insertion order, Vec alone makes "already
//      seen?" a linear scan; keeping both gives order and fast lookups
//    - The cost is storing each URL twice (one clone per new URL)
//
// 2. Why does collect_links take &Html instead of a String?
//    - Parsing is done once by the caller; borrowing the parsed document
//      means this function can't keep it alive or modify it
//    - scraper's Html isn't Send, so the pipeline drops it before awaiting
//
// 3. Why is the selector "a" and not "a[href]"?
//    - Anchors without an href still go through classify() so they show
//      up in the debug log as "no href found"
// -----------------------------------------------------------------------------
