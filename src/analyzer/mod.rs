//! Page analyzer
//!
//! Turns a fetched HTML page into SEO fields, a stemmed keyword table, and
//! the list of outgoing links. Scoring runs separately, once PageSpeed data
//! is attached to the record.

mod extract;
mod keywords;
mod score;
mod stemmer;
mod tfidf;

pub use extract::{extract_fields, Heading, PageFields};
pub use keywords::{format_keywords, Keyword, KeywordCounts, KeywordExtractor};
pub use score::{score_page, SeoScore, FULLY_OPTIMIZED};
pub use stemmer::stem;
pub use tfidf::{rank_sitewide, SitewideKeyword, SITEWIDE_VOCABULARY};

use crate::config::AnalysisConfig;
use crate::crawler::extract_links;
use crate::session::PageRecord;
use scraper::Html;
use url::Url;

/// Everything read from one page
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub fields: PageFields,
    pub keywords: KeywordCounts,
    /// Word tokens in the visible text, before stop-word filtering
    pub word_count: usize,
    /// Outgoing links, absolute, in document order
    pub links: Vec<Url>,
}

/// Stateless page analyzer, shared by all workers
#[derive(Debug, Clone, Default)]
pub struct PageAnalyzer {
    keywords: KeywordExtractor,
}

impl PageAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            keywords: KeywordExtractor::new(&config.extra_stop_words),
        }
    }

    /// Analyzes an HTML body fetched from `page_url`
    ///
    /// Relative links resolve against `<base href>` when present.
    pub fn analyze(&self, html: &str, page_url: &Url) -> PageAnalysis {
        let document = Html::parse_document(html);
        let base = base_url(&document, page_url);

        let fields = extract_fields(&document);
        let (keywords, word_count) = self.keywords.extract(&fields.text);
        let links = extract_links(&document, &base);

        PageAnalysis {
            fields,
            keywords,
            word_count,
            links,
        }
    }

    /// Computes score and recommendations and stores them on the record
    pub fn finalize(&self, record: &mut PageRecord) {
        let result = score_page(record, &self.keywords);
        record.score = result.score;
        record.recommendations = result.recommendations;
    }
}

fn base_url(document: &Html, page_url: &Url) -> Url {
    scraper::Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|base| base.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}
