//! CSV report: one row per analysed page

use crate::analyzer::format_keywords;
use crate::output::traits::{OutputResult, ReportOptions, ReportWriter};
use crate::session::{AnalysisSession, PageRecord};
use serde::Serialize;
use std::io::Write;

/// Column names, in [`CsvRow`] field order
const HEADERS: [&str; 25] = [
    "URL",
    "FinalURL",
    "StatusCode",
    "Source",
    "Depth",
    "Title",
    "TitleLength",
    "MetaDescription",
    "MetaDescriptionLength",
    "H1Count",
    "H2Count",
    "H3Count",
    "WordCount",
    "Keywords",
    "Canonical",
    "Noindex",
    "ImageCount",
    "ImagesWithoutAlt",
    "StructuredDataCount",
    "MicrodataCount",
    "InternalLinks",
    "PerformanceScoreMobile",
    "PerformanceScoreDesktop",
    "Score",
    "Recommendations",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    final_url: &'a str,
    status_code: u16,
    source: &'static str,
    depth: u32,
    title: &'a str,
    title_length: usize,
    meta_description: &'a str,
    meta_description_length: usize,
    h1_count: usize,
    h2_count: usize,
    h3_count: usize,
    word_count: usize,
    keywords: String,
    canonical: &'a str,
    noindex: bool,
    image_count: usize,
    images_without_alt: usize,
    structured_data_count: usize,
    microdata_count: usize,
    internal_links: usize,
    performance_score_mobile: Option<u8>,
    performance_score_desktop: Option<u8>,
    score: u8,
    recommendations: String,
}

impl<'a> CsvRow<'a> {
    fn new(record: &'a PageRecord, top_keywords: usize) -> Self {
        Self {
            url: &record.url,
            final_url: &record.final_url,
            status_code: record.status_code,
            source: record.source.to_db_string(),
            depth: record.depth,
            title: record.title.as_deref().unwrap_or(""),
            title_length: record.title_length(),
            meta_description: record.meta_description.as_deref().unwrap_or(""),
            meta_description_length: record.meta_description_length(),
            h1_count: record.h1_count,
            h2_count: record.h2_count,
            h3_count: record.h3_count,
            word_count: record.word_count,
            keywords: format_keywords(&record.keywords.top(top_keywords)),
            canonical: record.canonical.as_deref().unwrap_or(""),
            noindex: record.noindex,
            image_count: record.image_count,
            images_without_alt: record.images_without_alt,
            structured_data_count: record.structured_data_count,
            microdata_count: record.microdata_count,
            internal_links: record.internal_link_count,
            performance_score_mobile: record.pagespeed.mobile,
            performance_score_desktop: record.pagespeed.desktop,
            score: record.score,
            recommendations: record.recommendations.join(" | "),
        }
    }
}

/// Writes the per-page table, sorted by URL
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReport {
    options: ReportOptions,
}

impl CsvReport {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }
}

impl ReportWriter for CsvReport {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_report(&self, session: &AnalysisSession, out: &mut dyn Write) -> OutputResult<()> {
        // Header written explicitly so an empty session still gets one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(HEADERS)?;
        for record in session.sorted_records() {
            writer.serialize(CsvRow::new(record, self.options.top_keywords))?;
        }
        writer.flush()?;
        Ok(())
    }
}
