use std::fmt;
use url::Url;

/// How a crawl target was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoverySource {
    Sitemap,
    Bfs,
}

impl DiscoverySource {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::Bfs => "bfs",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "sitemap" => Some(Self::Sitemap),
            "bfs" => Some(Self::Bfs),
            _ => None,
        }
    }
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A URL admitted to the frontier
///
/// Immutable once enqueued. Depth is 0 for sitemap entries and the BFS root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    pub source: DiscoverySource,
    pub depth: u32,
}

impl CrawlTarget {
    pub fn new(url: Url, source: DiscoverySource, depth: u32) -> Self {
        Self { url, source, depth }
    }
}
