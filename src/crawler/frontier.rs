//! Crawl frontier
//!
//! This module holds the queue of admitted crawl targets:
//! - Sitemap mode: a fixed list, nothing is added later
//! - BFS mode: seeded with the root, grows with discovered links
//! - A visited set so no page is admitted twice
//! - The page cap, counted over admitted targets

use crate::session::{CrawlTarget, DiscoverySource};
use crate::url::page_key;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// FIFO queue of crawl targets for one session
///
/// Only the coordinator touches the frontier. Callers normalize and filter
/// URLs before offering them; the frontier deduplicates by [`page_key`]
/// (scheme and `www.` folded) and enforces depth and the page cap.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
    /// Page keys ever admitted or reached through a redirect
    seen: HashSet<String>,
    admitted: usize,
    /// Set once an unseen page was refused because of the cap
    capped: bool,
    max_pages: usize,
    max_depth: u32,
    source: DiscoverySource,
}

impl Frontier {
    fn empty(source: DiscoverySource, max_pages: usize, max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            admitted: 0,
            capped: false,
            max_pages,
            max_depth,
            source,
        }
    }

    /// Frontier over sitemap URLs, all at depth 0
    pub fn from_sitemap(urls: Vec<Url>, max_pages: usize) -> Self {
        let mut frontier = Self::empty(DiscoverySource::Sitemap, max_pages, 0);
        for url in urls {
            frontier.admit(url, 0);
        }
        frontier
    }

    /// BFS frontier seeded with the site root
    pub fn from_root(root: Url, max_pages: usize, max_depth: u32) -> Self {
        let mut frontier = Self::empty(DiscoverySource::Bfs, max_pages, max_depth);
        frontier.admit(root, 0);
        frontier
    }

    /// Offers a link found at `depth`; returns whether it was admitted
    ///
    /// Always refused in sitemap mode.
    pub fn offer(&mut self, url: Url, depth: u32) -> bool {
        if !self.follows_links() || depth > self.max_depth {
            return false;
        }
        self.admit(url, depth)
    }

    fn admit(&mut self, url: Url, depth: u32) -> bool {
        let key = page_key(&url);
        if self.seen.contains(&key) {
            return false;
        }
        if self.admitted >= self.max_pages {
            self.capped = true;
            return false;
        }
        self.seen.insert(key);
        self.admitted += 1;
        self.queue
            .push_back(CrawlTarget::new(url, self.source, depth));
        true
    }

    /// Records a page reached without being admitted (a redirect target)
    /// so later links to it are refused
    pub fn mark_seen(&mut self, url: &Url) {
        self.seen.insert(page_key(url));
    }

    pub fn next_target(&mut self) -> Option<CrawlTarget> {
        self.queue.pop_front()
    }

    pub fn follows_links(&self) -> bool {
        self.source == DiscoverySource::Bfs
    }

    pub fn source(&self) -> DiscoverySource {
        self.source
    }

    /// Targets admitted so far, including those already handed out
    pub fn admitted(&self) -> usize {
        self.admitted
    }

    /// Targets waiting to be handed out
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether the cap kept at least one page out
    ///
    /// A site with exactly `max_pages` pages is not capped.
    pub fn cap_reached(&self) -> bool {
        self.capped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    #[test]
    fn test_sitemap_frontier_dedupes_and_caps() {
        let urls = vec![url("/a"), url("/b"), url("/a"), url("/c"), url("/d")];
        let mut frontier = Frontier::from_sitemap(urls, 3);

        assert_eq!(frontier.admitted(), 3);
        assert!(frontier.cap_reached());

        let order: Vec<String> = std::iter::from_fn(|| frontier.next_target())
            .map(|t| t.url.path().to_string())
            .collect();
        assert_eq!(order, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_sitemap_frontier_follows_no_links() {
        let mut frontier = Frontier::from_sitemap(vec![url("/a")], 10);
        assert!(!frontier.follows_links());
        assert!(!frontier.offer(url("/b"), 1));
        assert_eq!(frontier.admitted(), 1);
    }

    #[test]
    fn test_bfs_depth_limit() {
        let mut frontier = Frontier::from_root(url("/"), 10, 1);
        let root = frontier.next_target().unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(root.source, DiscoverySource::Bfs);

        assert!(frontier.offer(url("/one"), 1));
        assert!(!frontier.offer(url("/two"), 2));
        assert_eq!(frontier.next_target().unwrap().depth, 1);
        assert!(frontier.next_target().is_none());
    }

    #[test]
    fn test_bfs_never_admits_twice() {
        let mut frontier = Frontier::from_root(url("/"), 10, 3);
        assert!(!frontier.offer(url("/"), 1));
        assert!(frontier.offer(url("/a"), 1));
        frontier.next_target();
        frontier.next_target();
        // Already handed out, still refused
        assert!(!frontier.offer(url("/a"), 2));
        assert_eq!(frontier.admitted(), 2);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_bfs_page_cap() {
        let mut frontier = Frontier::from_root(url("/"), 2, 5);
        assert!(!frontier.cap_reached());
        assert!(frontier.offer(url("/a"), 1));
        // Full, but nothing refused yet
        assert!(!frontier.cap_reached());
        // Known pages do not count as refused
        assert!(!frontier.offer(url("/a"), 2));
        assert!(!frontier.cap_reached());
        assert!(!frontier.offer(url("/b"), 1));
        assert!(frontier.cap_reached());
        assert_eq!(frontier.pending(), 2);
    }

    #[test]
    fn test_exact_page_count_is_not_capped() {
        let urls = vec![url("/a"), url("/b"), url("/c")];
        let frontier = Frontier::from_sitemap(urls, 3);
        assert_eq!(frontier.admitted(), 3);
        assert!(!frontier.cap_reached());
    }

    #[test]
    fn test_scheme_and_www_variants_are_one_page() {
        let mut frontier = Frontier::from_root(url("/"), 10, 3);
        assert!(frontier.offer(url("/a"), 1));
        assert!(!frontier.offer(Url::parse("http://www.example.com/a").unwrap(), 1));
        assert!(!frontier.offer(Url::parse("https://www.example.com/").unwrap(), 1));
        assert_eq!(frontier.admitted(), 2);
    }

    #[test]
    fn test_redirect_target_marked_seen() {
        let mut frontier = Frontier::from_root(url("/"), 10, 3);
        frontier.mark_seen(&url("/new"));
        assert!(!frontier.offer(url("/new"), 1));
        assert_eq!(frontier.admitted(), 1);
    }
}
