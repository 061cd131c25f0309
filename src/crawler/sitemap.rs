//! Sitemap discovery
//!
//! Sitemaps are scanned for `<loc>` values rather than parsed as full XML:
//! the root element decides between a `<urlset>` (page URLs) and a
//! `<sitemapindex>` (child sitemaps).

use crate::crawler::fetcher::Fetcher;
use crate::url::{normalize_parsed, page_key, LinkFilter};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Upper bound on sitemap documents fetched per session
pub const MAX_SITEMAP_DOCUMENTS: usize = 50;

/// Conventional sitemap locations, tried after robots.txt entries
const DEFAULT_SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml"];

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page URLs
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: child sitemap URLs
    Index(Vec<String>),
}

/// Classifies a document and extracts its `<loc>` values
///
/// Returns `None` for anything that is neither a urlset nor a sitemap index
/// (HTML error pages served with status 200, for instance).
pub fn parse_sitemap(xml: &str) -> Option<SitemapDocument> {
    let lower = xml.to_ascii_lowercase();
    let locs = extract_locs(xml, &lower);

    if lower.contains("<sitemapindex") {
        Some(SitemapDocument::Index(locs))
    } else if lower.contains("<urlset") {
        Some(SitemapDocument::UrlSet(locs))
    } else {
        None
    }
}

/// Collects trimmed, entity-decoded `<loc>` values
///
/// `lower` is the ASCII-lowercased `xml`; byte offsets match between the two.
fn extract_locs(xml: &str, lower: &str) -> Vec<String> {
    let mut locs = Vec::new();
    let mut pos = 0;

    while let Some(start_rel) = lower[pos..].find("<loc>") {
        let start = pos + start_rel + "<loc>".len();
        let Some(end_rel) = lower[start..].find("</loc>") else {
            break;
        };
        let end = start + end_rel;

        let raw = strip_cdata(xml[start..end].trim());
        let value = decode_entities(raw.trim());
        if !value.is_empty() {
            locs.push(value);
        }
        pos = end + "</loc>".len();
    }

    locs
}

fn strip_cdata(value: &str) -> &str {
    value
        .strip_prefix("<![CDATA[")
        .and_then(|v| v.strip_suffix("]]>"))
        .unwrap_or(value)
}

/// Decodes the five predefined XML entities
fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Sitemap URLs to try, in order: robots.txt entries, then the defaults
pub fn sitemap_candidates(root: &Url, robots_sitemaps: &[String]) -> Vec<Url> {
    let mut candidates: Vec<Url> = Vec::new();

    let declared = robots_sitemaps.iter().filter_map(|s| Url::parse(s).ok());
    let defaults = DEFAULT_SITEMAP_PATHS.iter().filter_map(|p| root.join(p).ok());

    for url in declared.chain(defaults) {
        if !candidates.contains(&url) {
            candidates.push(url);
        }
    }

    candidates
}

/// Walks sitemaps breadth-first and returns admissible page URLs
///
/// Sitemap indexes queue their children; every sitemap URL is fetched at most
/// once and at most [`MAX_SITEMAP_DOCUMENTS`] are fetched. Page URLs are
/// normalized, run through `filter`, and deduplicated by [`page_key`] in
/// discovery order.
/// Stops once `page_limit` URLs were collected. Fetch and parse failures are
/// logged and skipped, so an empty result means "no usable sitemap".
pub async fn discover_sitemap_urls(
    fetcher: &Fetcher,
    filter: &LinkFilter,
    robots_sitemaps: &[String],
    page_limit: usize,
) -> Vec<Url> {
    let mut queue: VecDeque<Url> =
        sitemap_candidates(filter.scope().root(), robots_sitemaps).into();
    let mut fetched: HashSet<Url> = HashSet::new();
    let mut seen_pages: HashSet<String> = HashSet::new();
    let mut pages: Vec<Url> = Vec::new();
    let mut rejected = 0usize;

    while let Some(sitemap_url) = queue.pop_front() {
        if pages.len() >= page_limit || fetched.len() >= MAX_SITEMAP_DOCUMENTS {
            break;
        }
        if !fetched.insert(sitemap_url.clone()) {
            continue;
        }

        let document = match fetcher.fetch_document(&sitemap_url).await {
            Ok(page) => page,
            Err(failure) => {
                tracing::debug!("Sitemap {} unavailable: {}", sitemap_url, failure.reason);
                continue;
            }
        };

        match parse_sitemap(&document.body) {
            Some(SitemapDocument::Index(children)) => {
                tracing::debug!("Sitemap index {} lists {} sitemaps", sitemap_url, children.len());
                for child in children {
                    match sitemap_url.join(&child) {
                        Ok(url) if !fetched.contains(&url) => queue.push_back(url),
                        Ok(_) => {}
                        Err(e) => tracing::debug!("Bad sitemap loc '{}': {}", child, e),
                    }
                }
            }
            Some(SitemapDocument::UrlSet(locs)) => {
                tracing::debug!("Sitemap {} lists {} pages", sitemap_url, locs.len());
                for loc in locs {
                    if pages.len() >= page_limit {
                        break;
                    }
                    let url = match sitemap_url.join(&loc).map_err(|e| e.to_string()).and_then(
                        |url| normalize_parsed(url).map_err(|e| e.to_string()),
                    ) {
                        Ok(url) => url,
                        Err(e) => {
                            tracing::debug!("Bad page loc '{}': {}", loc, e);
                            continue;
                        }
                    };
                    if let Err(rejection) = filter.check(&url) {
                        tracing::trace!("Sitemap URL {} rejected: {:?}", url, rejection);
                        rejected += 1;
                        continue;
                    }
                    if seen_pages.insert(page_key(&url)) {
                        pages.push(url);
                    }
                }
            }
            None => {
                tracing::warn!("{} is not a sitemap, skipping", sitemap_url);
            }
        }
    }

    tracing::info!(
        "Sitemap discovery found {} page URLs in {} documents ({} rejected)",
        pages.len(),
        fetched.len(),
        rejected
    );
    pages
}
