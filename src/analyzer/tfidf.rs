//! Site-wide keyword ranking by TF-IDF
//!
//! Each page is one document. Terms used everywhere weigh less than terms
//! that set a few pages apart, so the ranking surfaces what the site is
//! about rather than its boilerplate.

use crate::analyzer::keywords::KeywordCounts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Terms considered: the most frequent over the whole site
pub const SITEWIDE_VOCABULARY: usize = 100;

/// A keyword ranked over the whole site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitewideKeyword {
    pub term: String,
    /// Summed TF-IDF weight over every page
    pub weight: f64,
    /// Occurrences over every page
    pub count: u32,
}

/// Ranks terms across pages by summed TF-IDF weight
///
/// # Weighting
///
/// 1. Vocabulary: the [`SITEWIDE_VOCABULARY`] terms with the highest total
///    count (ties by term)
/// 2. Per page, `tf` is the raw count and
///    `idf = ln((1 + pages) / (1 + pages_with_term)) + 1`
/// 3. Each page's `tf * idf` vector is scaled to unit length
/// 4. A term's weight is the sum of its entries over every page
///
/// Sorted by weight descending, then term ascending.
pub fn rank_sitewide<'a, I>(pages: I) -> Vec<SitewideKeyword>
where
    I: IntoIterator<Item = &'a KeywordCounts>,
{
    let pages: Vec<&KeywordCounts> = pages.into_iter().collect();

    let mut totals = KeywordCounts::new();
    let mut document_frequency: BTreeMap<&str, u32> = BTreeMap::new();
    for page in &pages {
        totals.merge(page);
        for (term, _) in page.iter().filter(|&(_, count)| count > 0) {
            *document_frequency.entry(term).or_insert(0) += 1;
        }
    }

    let vocabulary = totals.top(SITEWIDE_VOCABULARY);
    if vocabulary.is_empty() {
        return Vec::new();
    }

    let page_count = pages.len() as f64;
    let idf: Vec<f64> = vocabulary
        .iter()
        .map(|keyword| {
            let df = document_frequency
                .get(keyword.term.as_str())
                .copied()
                .unwrap_or(0) as f64;
            ((1.0 + page_count) / (1.0 + df)).ln() + 1.0
        })
        .collect();

    let mut weights = vec![0.0; vocabulary.len()];
    for page in &pages {
        let vector: Vec<f64> = vocabulary
            .iter()
            .zip(&idf)
            .map(|(keyword, idf)| f64::from(page.get(&keyword.term)) * idf)
            .collect();
        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (weight, value) in weights.iter_mut().zip(&vector) {
            *weight += value / norm;
        }
    }

    let mut ranked: Vec<SitewideKeyword> = vocabulary
        .into_iter()
        .zip(weights)
        .map(|(keyword, weight)| SitewideKeyword {
            term: keyword.term,
            weight,
            count: keyword.count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.term.cmp(&b.term))
    });
    ranked
}
