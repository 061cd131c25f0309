use crate::robots::ParsedRobots;
use crate::url::domain::site_key;
use url::Url;

/// The site being audited: its root URL and identity
#[derive(Debug, Clone)]
pub struct SiteScope {
    root: Url,
    key: String,
}

impl SiteScope {
    /// Builds a scope from a normalized root URL; `None` when it has no host
    pub fn new(root: Url) -> Option<Self> {
        let key = site_key(&root)?;
        Some(Self { root, key })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Host identity, `www.` stripped (used in report names)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `url` is on the same site as the root
    pub fn contains(&self, url: &Url) -> bool {
        site_key(url).as_deref() == Some(self.key.as_str())
    }
}

/// Why a URL was kept out of the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnsupportedScheme,
    OffSite,
    IgnoredExtension,
    /// The path contains one of the excluded words
    ExcludedPath,
    RobotsDenied,
}

/// Decides which discovered URLs may become crawl targets
///
/// Sitemap entries and BFS links go through the same checks.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    scope: SiteScope,
    ignored_extensions: Vec<String>,
    excluded_path_words: Vec<String>,
    robots: ParsedRobots,
    robots_agent: String,
}

impl LinkFilter {
    pub fn new(
        scope: SiteScope,
        ignored_extensions: &[String],
        excluded_path_words: &[String],
        robots: ParsedRobots,
        robots_agent: &str,
    ) -> Self {
        let lowercase = |values: &[String]| -> Vec<String> {
            values.iter().map(|v| v.trim().to_lowercase()).collect()
        };
        Self {
            scope,
            ignored_extensions: lowercase(ignored_extensions),
            excluded_path_words: lowercase(excluded_path_words),
            robots,
            robots_agent: robots_agent.to_string(),
        }
    }

    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }

    pub fn robots(&self) -> &ParsedRobots {
        &self.robots
    }

    /// Checks a (normalized) URL against every admission rule
    pub fn check(&self, url: &Url) -> Result<(), Rejection> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Rejection::UnsupportedScheme);
        }
        if !self.scope.contains(url) {
            return Err(Rejection::OffSite);
        }
        if self.has_ignored_extension(url) {
            return Err(Rejection::IgnoredExtension);
        }
        if self.has_excluded_word(url) {
            return Err(Rejection::ExcludedPath);
        }
        if !self.robots.is_allowed(url.as_str(), &self.robots_agent) {
            return Err(Rejection::RobotsDenied);
        }
        Ok(())
    }

    pub fn admits(&self, url: &Url) -> bool {
        self.check(url).is_ok()
    }

    fn has_ignored_extension(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.ignored_extensions.iter().any(|ext| path.ends_with(ext))
    }

    /// Substring match, so `login` also excludes `/member-login/`
    fn has_excluded_word(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.excluded_path_words
            .iter()
            .any(|word| path.contains(word.as_str()))
    }
}
