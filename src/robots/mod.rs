//! Robots.txt handling module
//!
//! Fetches the audited site's robots.txt once per session. Any failure to
//! obtain it is treated as "everything allowed".

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::Fetcher;
use url::Url;

/// Fetches robots.txt for the site rooted at `root`
///
/// Goes through the crawl's [`Fetcher`], so basic-auth credentials, retries
/// and redirects apply as for any other document. Never fails: any fetch
/// failure yields [`ParsedRobots::allow_all`].
pub async fn fetch_robots(fetcher: &Fetcher, root: &Url) -> ParsedRobots {
    let robots_url = match root.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}", root, e);
            return ParsedRobots::allow_all();
        }
    };

    match fetcher.fetch_document(&robots_url).await {
        Ok(document) => {
            let robots = ParsedRobots::from_content(&document.body);
            tracing::info!(
                "Loaded robots.txt from {} ({} sitemap entries)",
                robots_url,
                robots.sitemaps().len()
            );
            robots
        }
        Err(failure) => {
            tracing::debug!(
                "robots.txt unavailable at {} ({}), allowing all",
                robots_url,
                failure.reason
            );
            ParsedRobots::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use crate::crawler::{build_http_client, BasicCredential, RetryPolicy};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(credential: Option<BasicCredential>) -> Fetcher {
        let agent = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        let retry = RetryPolicy {
            max_retries: 0,
            base_backoff: Duration::from_millis(1),
        };
        Fetcher::new(build_http_client(&agent, 5).unwrap(), retry, credential)
    }

    #[tokio::test]
    async fn test_robots_sent_basic_auth() {
        let server = MockServer::start().await;
        // "user:pw" in base64
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .and(header("authorization", "Basic dXNlcjpwdw=="))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let root = Url::parse(&format!("{}/", server.uri())).unwrap();
        let credential = BasicCredential {
            username: "user".to_string(),
            password: "pw".to_string(),
        };
        let robots = fetch_robots(&fetcher(Some(credential)), &root).await;

        let private = format!("{}/private/a", server.uri());
        assert!(!robots.is_allowed(&private, "TestCrawler"));
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        let root = Url::parse(&format!("{}/", server.uri())).unwrap();

        let robots = fetch_robots(&fetcher(None), &root).await;
        let page = format!("{}/anything", server.uri());
        assert!(robots.is_allowed(&page, "TestCrawler"));
    }
}
