// src/crawl/mod.rs
// =============================================================================
// This module finds the pages a report will audit.
//
// Submodules:
// - fetch: downloads the seed page (one request, redirects followed)
// - classify: decides whether a single href is kept, and in what form
// - collect: runs every anchor on the page through classify and builds
//   the deduplicated frontier
//
// Only the seed page's own links are collected; we don't crawl further.
// =============================================================================

mod classify;
mod collect;
mod fetch;

pub use classify::Origin;
pub use collect::{collect_links, Frontier};
pub use fetch::{build_client, fetch_page};
