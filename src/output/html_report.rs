//! HTML summary report
//!
//! A single self-contained page: run metadata, overview numbers, site-wide
//! keywords, the per-page table and the failure table. Every piece of page
//! text goes through [`escape_html`].

use crate::analyzer::format_keywords;
use crate::output::traits::{OutputResult, ReportOptions, ReportWriter};
use crate::session::AnalysisSession;
use std::fmt::Write as _;
use std::io::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;margin-bottom:2em}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left;vertical-align:top}\
th{background:#f0f0f0}";

/// Escapes text for use in HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn optional_score(score: Option<u8>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReport {
    options: ReportOptions,
}

impl HtmlReport {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Renders the whole document
    pub fn render(&self, session: &AnalysisSession) -> String {
        let mut html = String::new();
        let domain = escape_html(&session.domain);

        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>SEO report: {}</title>\n<style>{}</style>\n</head>\n<body>\n",
            domain, STYLE
        );
        let _ = writeln!(html, "<h1>SEO report: {}</h1>", domain);

        self.render_overview(session, &mut html);
        self.render_sitewide(session, &mut html);
        self.render_pages(session, &mut html);
        render_failures(session, &mut html);

        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_overview(&self, session: &AnalysisSession, html: &mut String) {
        html.push_str("<h2>Overview</h2>\n<table>\n");
        let mut row = |label: &str, value: String| {
            let _ = writeln!(
                html,
                "<tr><th>{}</th><td>{}</td></tr>",
                label,
                escape_html(&value)
            );
        };

        row("Site", session.root_url.clone());
        row(
            "Started",
            session.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        if let Some(finished) = session.finished_at {
            row("Finished", finished.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        }
        if let Some(secs) = session.duration_secs() {
            row("Duration", format!("{} s", secs));
        }
        row("Status", session.status.to_db_string().to_string());
        row(
            "Discovery",
            session
                .discovery
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
        );
        row("Pages analysed", session.records.len().to_string());
        row("Failures", session.failures.len().to_string());
        row(
            "Average score",
            session
                .average_score()
                .map_or_else(|| "-".to_string(), |avg| format!("{:.1}", avg)),
        );
        row("Total words", session.total_word_count().to_string());

        html.push_str("</table>\n");
    }

    fn render_sitewide(&self, session: &AnalysisSession, html: &mut String) {
        let top = session.sitewide_keywords(self.options.sitewide_keywords);

        html.push_str("<h2>Site-wide keywords</h2>\n");
        if top.is_empty() {
            html.push_str("<p>No keywords found.</p>\n");
            return;
        }

        html.push_str(
            "<table>\n<tr><th>#</th><th>Keyword</th><th>TF-IDF</th><th>Count</th></tr>\n",
        );
        for (rank, keyword) in top.iter().enumerate() {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{:.3}</td><td>{}</td></tr>",
                rank + 1,
                escape_html(&keyword.term),
                keyword.weight,
                keyword.count
            );
        }
        html.push_str("</table>\n");
    }

    fn render_pages(&self, session: &AnalysisSession, html: &mut String) {
        let _ = writeln!(html, "<h2>Pages ({})</h2>", session.records.len());
        html.push_str(
            "<table>\n<tr><th>URL</th><th>Title</th><th>Words</th><th>H1</th><th>H2</th>\
             <th>Images w/o alt</th><th>Mobile</th><th>Desktop</th><th>Keywords</th>\
             <th>Score</th><th>Recommendations</th></tr>\n",
        );

        for record in session.sorted_records() {
            let url = escape_html(&record.url);
            let recommendations: Vec<String> = record
                .recommendations
                .iter()
                .map(|r| format!("<li>{}</li>", escape_html(r)))
                .collect();

            let _ = writeln!(
                html,
                "<tr><td><a href=\"{url}\">{url}</a></td><td>{}</td><td>{}</td><td>{}</td>\
                 <td>{}</td><td>{}/{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
                 <td><ul>{}</ul></td></tr>",
                escape_html(record.title.as_deref().unwrap_or("")),
                record.word_count,
                record.h1_count,
                record.h2_count,
                record.images_without_alt,
                record.image_count,
                optional_score(record.pagespeed.mobile),
                optional_score(record.pagespeed.desktop),
                escape_html(&format_keywords(
                    &record.keywords.top(self.options.top_keywords)
                )),
                record.score,
                recommendations.concat(),
                url = url,
            );
        }
        html.push_str("</table>\n");
    }
}

fn render_failures(session: &AnalysisSession, html: &mut String) {
    let _ = writeln!(html, "<h2>Failures ({})</h2>", session.failures.len());
    if session.failures.is_empty() {
        html.push_str("<p>None.</p>\n");
        return;
    }

    html.push_str(
        "<table>\n<tr><th>URL</th><th>Kind</th><th>Status</th><th>Reason</th>\
         <th>Attempts</th></tr>\n",
    );
    for failure in session.sorted_failures() {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&failure.url),
            failure.kind,
            failure
                .status_code
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            escape_html(&failure.reason),
            failure.attempts
        );
    }
    html.push_str("</table>\n");
}

impl ReportWriter for HtmlReport {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn write_report(&self, session: &AnalysisSession, out: &mut dyn Write) -> OutputResult<()> {
        out.write_all(self.render(session).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
