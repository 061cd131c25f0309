//! SEO score (0-100) and recommendations

use crate::analyzer::keywords::KeywordExtractor;
use crate::session::PageRecord;

/// Recommendation emitted when nothing is left to improve
pub const FULLY_OPTIMIZED: &str = "Fully optimized!";

/// Score and recommendations for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoScore {
    pub score: u8,
    pub recommendations: Vec<String>,
}

/// Scores a page record
///
/// Uses the record's extracted fields and PageSpeed scores, so it must run
/// after both are filled. The canonical slug check needs the stop-word list.
pub fn score_page(record: &PageRecord, keywords: &KeywordExtractor) -> SeoScore {
    let mut score: i32 = 0;
    let mut recs: Vec<String> = Vec::new();
    let mut recommend = |text: &str| recs.push(text.to_string());

    let title_len = record.title.as_deref().map_or(0, |t| t.chars().count());
    if (50..=60).contains(&title_len) {
        score += 10;
    } else {
        recommend("Adjust Title length to ~50-60 chars.");
    }

    let meta_len = record
        .meta_description
        .as_deref()
        .map_or(0, |m| m.chars().count());
    if (120..=160).contains(&meta_len) {
        score += 10;
    } else {
        recommend("Adjust Meta Description to ~120-160 chars.");
    }

    if record.h1_count > 0 {
        score += 10;
    } else {
        recommend("Include at least 1 H1 tag.");
    }

    if record.h2_count >= 1 {
        score += 5;
    } else {
        recommend("Add H2 tags for subtopics.");
    }

    if record.word_count >= 300 {
        score += 10;
    } else {
        recommend("Add more textual content (300+ words).");
    }

    if record.image_count > 0 {
        let with_alt = record.image_count - record.images_without_alt.min(record.image_count);
        if with_alt as f64 / record.image_count as f64 >= 0.8 {
            score += 10;
        } else {
            recommend("Add alt text to most images.");
        }
    } else {
        recommend("Consider adding relevant images with alt text.");
    }

    match &record.canonical {
        Some(canonical) => {
            score += 5;
            let path = url::Url::parse(canonical)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| canonical.clone());
            if keywords.slug_stop_word_ratio(&path) > 0.5 {
                score -= 5;
                recommend("Reduce meaningless/stop words in canonical slug.");
            }
        }
        None => recommend("Include a canonical link if possible."),
    }

    if record.noindex {
        recommend("Remove 'noindex' unless intentionally blocking search engines.");
    } else {
        score += 10;
    }

    if record.structured_data_count > 0 || record.microdata_count > 0 {
        score += 5;
    } else {
        recommend("Add structured data (JSON-LD or microdata).");
    }

    for (label, value) in [
        ("mobile", record.pagespeed.mobile),
        ("desktop", record.pagespeed.desktop),
    ] {
        match value {
            Some(perf) if perf >= 90 => score += 5,
            Some(perf) if perf >= 70 => score += 3,
            Some(_) => recommend(&format!("Improve {} performance per PageSpeed.", label)),
            None => recommend(&format!("Consider PageSpeed analysis ({}).", label)),
        }
    }

    if record.title.is_some() && record.meta_description.is_some() && !record.noindex {
        score += 10;
    }

    if recs.is_empty() {
        recs.push(FULLY_OPTIMIZED.to_string());
    }

    SeoScore {
        score: score.clamp(0, 100) as u8,
        recommendations: recs,
    }
}
