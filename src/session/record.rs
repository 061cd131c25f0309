//! Per-page results: analysed records and failures

use crate::analyzer::{Heading, KeywordCounts};
use crate::pagespeed::PageSpeedScores;
use crate::session::DiscoverySource;
use chrono::{DateTime, Utc};
use std::fmt;

/// A successfully fetched and analysed page
///
/// Filled by the analyzer, enriched by the PageSpeed client, then scored.
/// Read-only once recorded in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// URL of the crawl target
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    /// Raw HTML; kept in memory only
    pub body: String,
    pub source: DiscoverySource,
    pub depth: u32,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub headings: Vec<Heading>,
    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub word_count: usize,
    pub keywords: KeywordCounts,
    pub canonical: Option<String>,
    pub noindex: bool,
    pub image_count: usize,
    pub images_without_alt: usize,
    pub structured_data_count: usize,
    pub microdata_count: usize,
    pub internal_link_count: usize,
    pub pagespeed: PageSpeedScores,
    pub score: u8,
    pub recommendations: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn title_length(&self) -> usize {
        self.title.as_deref().map_or(0, |t| t.chars().count())
    }

    pub fn meta_description_length(&self) -> usize {
        self.meta_description
            .as_deref()
            .map_or(0, |m| m.chars().count())
    }
}

/// Why a page could not be analysed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    /// HTTP 404 or 410
    DeadLink,
    /// Other HTTP error status
    HttpError,
    /// HTTP 429 after all retries
    RateLimited,
    Timeout,
    /// Connection refused, DNS failure, TLS error
    Unreachable,
    /// Response is not HTML
    ContentMismatch,
    /// Anything else (body read errors, redirect loops)
    Failed,
}

impl FailureKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::DeadLink => "dead_link",
            Self::HttpError => "http_error",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::ContentMismatch => "content_mismatch",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "dead_link" => Some(Self::DeadLink),
            "http_error" => Some(Self::HttpError),
            "rate_limited" => Some(Self::RateLimited),
            "timeout" => Some(Self::Timeout),
            "unreachable" => Some(Self::Unreachable),
            "content_mismatch" => Some(Self::ContentMismatch),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn all() -> [Self; 7] {
        [
            Self::DeadLink,
            Self::HttpError,
            Self::RateLimited,
            Self::Timeout,
            Self::Unreachable,
            Self::ContentMismatch,
            Self::Failed,
        ]
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A crawl target that could not be fetched or analysed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: String,
    pub source: DiscoverySource,
    pub depth: u32,
    pub kind: FailureKind,
    pub status_code: Option<u16>,
    pub reason: String,
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_roundtrip() {
        for kind in FailureKind::all() {
            assert_eq!(FailureKind::from_db_string(kind.to_db_string()), Some(kind));
        }
        assert_eq!(FailureKind::from_db_string("exploded"), None);
    }

    #[test]
    fn test_lengths_count_characters() {
        let mut record = crate::session::test_support::blank_record("https://example.com/");
        record.title = Some("Café".to_string());
        record.meta_description = Some("ünïcode".to_string());
        assert_eq!(record.title_length(), 4);
        assert_eq!(record.meta_description_length(), 7);
    }
}
