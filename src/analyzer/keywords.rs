//! Keyword extraction: tokenizing, stop-word removal, stemming, ranking

use crate::analyzer::stemmer::stem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Built-in English stop words
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "also", "am", "an", "and",
    "another", "any", "are", "aren", "aren't", "as", "at", "be", "because", "been", "before",
    "being", "below", "between", "both", "but", "by", "can", "couldn", "couldn't", "d", "did",
    "didn", "didn't", "do", "does", "doesn", "doesn't", "doing", "don", "don't", "down",
    "during", "each", "few", "for", "from", "further", "had", "hadn", "hadn't", "has", "hasn",
    "hasn't", "have", "haven", "haven't", "having", "he", "he'd", "he'll", "he's", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "i", "i'd", "i'll", "i'm",
    "i've", "if", "in", "into", "is", "isn", "isn't", "it", "it'd", "it'll", "it's", "its",
    "itself", "just", "ll", "m", "ma", "me", "mightn", "mightn't", "more", "most", "mustn",
    "mustn't", "my", "myself", "needn", "needn't", "no", "nor", "not", "now", "o", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "re",
    "s", "same", "shan", "shan't", "she", "she'd", "she'll", "she's", "should", "should've",
    "shouldn", "shouldn't", "so", "some", "such", "t", "than", "that", "that'll", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "they'd",
    "they'll", "they're", "they've", "this", "those", "through", "to", "too", "under", "until",
    "up", "ve", "very", "was", "wasn", "wasn't", "we", "we'd", "we'll", "we're", "we've",
    "were", "weren", "weren't", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "won", "won't", "would", "wouldn", "wouldn't", "y", "you", "you'd",
    "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
];

/// A ranked keyword: stemmed term and its frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub count: u32,
}

/// Frequency table of stemmed terms
///
/// Backed by an ordered map so iteration, and therefore ranking ties, never
/// depend on hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCounts {
    counts: BTreeMap<String, u32>,
}

impl KeywordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, term: &str, count: u32) {
        *self.counts.entry(term.to_string()).or_insert(0) += count;
    }

    pub fn merge(&mut self, other: &KeywordCounts) {
        for (term, count) in &other.counts {
            self.add(term, *count);
        }
    }

    pub fn get(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all term frequencies
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(t, &c)| (t.as_str(), c))
    }

    /// All terms, count descending then term ascending
    pub fn ranked(&self) -> Vec<Keyword> {
        let mut ranked: Vec<Keyword> = self
            .counts
            .iter()
            .map(|(term, &count)| Keyword {
                term: term.clone(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<Keyword> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

impl FromIterator<(String, u32)> for KeywordCounts {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        let mut counts = KeywordCounts::new();
        for (term, count) in iter {
            counts.add(&term, count);
        }
        counts
    }
}

/// Renders keywords as `term(count), term(count)`
pub fn format_keywords(keywords: &[Keyword]) -> String {
    keywords
        .iter()
        .map(|k| format!("{}({})", k.term, k.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tokenizes, filters and stems page text
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_words: HashSet<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl KeywordExtractor {
    /// Creates an extractor using the built-in list plus `extra_stop_words`
    pub fn new(extra_stop_words: &[String]) -> Self {
        let mut stop_words: HashSet<String> = STOP_WORDS.iter().map(|w| w.to_string()).collect();
        stop_words.extend(extra_stop_words.iter().map(|w| w.trim().to_lowercase()));
        Self { stop_words }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Splits lowercase text into word tokens
    ///
    /// Letters and apostrophes form words; everything else separates them.
    /// Typographic apostrophes are folded to `'`, a trailing possessive `'s`
    /// is dropped, and stray leading/trailing apostrophes are trimmed.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '\u{2019}'))
            .filter_map(|raw| {
                let folded = raw.replace('\u{2019}', "'");
                let trimmed = folded.trim_matches('\'');
                let word = trimmed.strip_suffix("'s").unwrap_or(trimmed);
                (!word.is_empty()).then(|| word.to_string())
            })
            .collect()
    }

    /// Counts stemmed keywords in `text`
    ///
    /// Returns the keyword table and the number of word tokens seen before
    /// filtering.
    pub fn extract(&self, text: &str) -> (KeywordCounts, usize) {
        let tokens = Self::tokenize(text);
        let word_count = tokens.len();
        let mut counts = KeywordCounts::new();

        for token in &tokens {
            if self.is_stop_word(token) {
                continue;
            }
            let word: String = token.chars().filter(|&c| c != '\'').collect();
            if word.chars().count() < 2 || self.is_stop_word(&word) {
                continue;
            }
            counts.add(&stem(&word), 1);
        }

        (counts, word_count)
    }

    /// Share of stop words among the slug words of a URL path
    ///
    /// Slug words are the runs of `[a-z0-9]` in the whole lowercased path, so
    /// every segment counts, not just the last. Returns 0.0 when there are
    /// none.
    pub fn slug_stop_word_ratio(&self, path: &str) -> f64 {
        let lower = path.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return 0.0;
        }

        let stops = words.iter().filter(|w| self.is_stop_word(w)).count();
        stops as f64 / words.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_handles_possessives_and_punctuation() {
        let tokens = KeywordExtractor::tokenize("John’s SEO-guide: it's 2024, rank #1!");
        assert_eq!(tokens, vec!["john", "seo", "guide", "it", "rank"]);
    }

    #[test]
    fn test_tokenize_keeps_contractions() {
        let tokens = KeywordExtractor::tokenize("Don't 'quote' me");
        assert_eq!(tokens, vec!["don't", "quote", "me"]);
    }

    #[test]
    fn test_extract_filters_stop_words_and_stems() {
        let extractor = KeywordExtractor::default();
        let (counts, words) =
            extractor.extract("The runners were running, and the runner runs. Don't stop!");

        assert_eq!(words, 10);
        assert_eq!(counts.get("run"), 2);
        assert_eq!(counts.get("runner"), 2);
        assert_eq!(counts.get("stop"), 1);
        assert_eq!(counts.get("the"), 0);
        assert_eq!(counts.get("dont"), 0);
    }

    #[test]
    fn test_extra_stop_words() {
        let extractor = KeywordExtractor::new(&["Widgets".to_string()]);
        let (counts, _) = extractor.extract("widgets widgets gadgets");
        assert_eq!(counts.get("widget"), 0);
        assert_eq!(counts.get("gadget"), 1);
    }

    #[test]
    fn test_ranking_breaks_ties_alphabetically() {
        let counts: KeywordCounts = vec![
            ("zebra".to_string(), 3),
            ("apple".to_string(), 3),
            ("mango".to_string(), 5),
            ("kiwi".to_string(), 1),
        ]
        .into_iter()
        .collect();

        let top = counts.top(3);
        let terms: Vec<&str> = top.iter().map(|k| k.term.as_str()).collect();
        assert_eq!(terms, vec!["mango", "apple", "zebra"]);
        assert_eq!(format_keywords(&top), "mango(5), apple(3), zebra(3)");
    }

    #[test]
    fn test_merge_and_total() {
        let mut a: KeywordCounts = vec![("seo".to_string(), 2)].into_iter().collect();
        let b: KeywordCounts = vec![("seo".to_string(), 1), ("audit".to_string(), 4)]
            .into_iter()
            .collect();
        a.merge(&b);
        assert_eq!(a.get("seo"), 3);
        assert_eq!(a.total(), 7);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = KeywordExtractor::default();
        let text = "Search engines rank optimized pages; optimization ranks searches.";
        let first = extractor.extract(text).0.ranked();
        let second = extractor.extract(text).0.ranked();
        assert_eq!(first, second);
    }

    #[test]
    fn test_slug_stop_word_ratio() {
        let extractor = KeywordExtractor::default();
        // blog, how, to, fix, it
        assert_eq!(extractor.slug_stop_word_ratio("/blog/how-to-fix-it"), 0.6);
        assert_eq!(extractor.slug_stop_word_ratio("/blog/seo-audit-guide/"), 0.0);
        assert_eq!(extractor.slug_stop_word_ratio("/"), 0.0);
    }

    #[test]
    fn test_slug_words_span_every_segment() {
        let extractor = KeywordExtractor::default();
        // Stop words in earlier segments count too
        assert_eq!(extractor.slug_stop_word_ratio("/how/to/do/seo"), 0.75);
        assert_eq!(extractor.slug_stop_word_ratio("/the/a/seo-guide"), 0.5);
        // Any other character separates words: blog, 2024, what, is, this
        assert_eq!(extractor.slug_stop_word_ratio("/Blog_2024/What.IS.This"), 0.6);
    }
}
