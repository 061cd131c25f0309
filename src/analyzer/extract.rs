//! On-page field extraction

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Elements whose text never counts as page content
const HIDDEN_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// A heading element and its text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// SEO-relevant fields read from one HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFields {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub headings: Vec<Heading>,
    pub canonical: Option<String>,
    pub noindex: bool,
    pub image_count: usize,
    pub images_without_alt: usize,
    pub structured_data_count: usize,
    pub microdata_count: usize,
    /// Visible text, used for keyword extraction
    pub text: String,
}

impl PageFields {
    pub fn heading_count(&self, level: u8) -> usize {
        self.headings.iter().filter(|h| h.level == level).count()
    }
}

/// Reads every field from a parsed document
pub fn extract_fields(document: &Html) -> PageFields {
    let (image_count, images_without_alt) = count_images(document);

    PageFields {
        title: first_text(document, "title"),
        meta_description: first_attr(document, "meta[name='description' i]", "content"),
        headings: extract_headings(document),
        canonical: first_attr(document, "link[rel='canonical' i]", "href"),
        noindex: first_attr(document, "meta[name='robots' i]", "content")
            .is_some_and(|content| content.to_ascii_lowercase().contains("noindex")),
        image_count,
        images_without_alt,
        structured_data_count: count(document, "script[type='application/ld+json' i]"),
        microdata_count: count(document, "[itemtype]"),
        text: visible_text(document),
    }
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn count(document: &Html, css: &str) -> usize {
    Selector::parse(css)
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0)
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let level = element.value().name().strip_prefix('h')?.parse::<u8>().ok()?;
            Some(Heading {
                level,
                text: collapse_whitespace(&element.text().collect::<String>()),
            })
        })
        .collect()
}

/// Returns (images, images with a missing or blank alt)
///
/// An alt that is empty or only whitespace counts as missing, including the
/// `alt=""` of decorative images.
fn count_images(document: &Html) -> (usize, usize) {
    let Ok(selector) = Selector::parse("img") else {
        return (0, 0);
    };

    document.select(&selector).fold((0, 0), |(total, missing), img| {
        let has_alt = img
            .value()
            .attr("alt")
            .is_some_and(|alt| !alt.trim().is_empty());
        (total + 1, if has_alt { missing } else { missing + 1 })
    })
}

/// Concatenates text nodes outside script/style/noscript/template
fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_TEXT_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            text.push_str(chunk);
            text.push(' ');
        }
    }

    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
