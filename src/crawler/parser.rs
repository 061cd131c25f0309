//! HTML helpers the crawler needs from fetched pages
//!
//! - Links to follow (from `<a>` tags and the canonical link)
//! - The site's password form, for form login

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts followable links from a parsed document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to http(s)
///
/// Links are returned absolute, without fragment, in document order, each
/// at most once. `rel="nofollow"` links are included.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links: Vec<Url> = Vec::new();
    let mut push = |url: Url| {
        if !links.contains(&url) {
            links.push(url);
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                push(url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                push(url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL without fragment
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Password field name used when the form's input has none
pub const DEFAULT_PASSWORD_FIELD: &str = "password_protected_pwd";

/// A password form found on a page, ready to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Resolved form action
    pub action: Url,
    /// Name of the password input
    pub password_field: String,
    /// Other named inputs with their default values (hidden fields, submit)
    pub fields: Vec<(String, String)>,
}

impl LoginForm {
    /// Form fields with the password filled in
    pub fn submission(&self, password: &str) -> Vec<(String, String)> {
        let mut fields = self.fields.clone();
        fields.push((self.password_field.clone(), password.to_string()));
        fields
    }
}

/// Finds the site's password form
///
/// Prefers a form posting to `password-protected=login` (the WordPress
/// password-protected plugin). Otherwise takes the first form containing a
/// password input.
pub fn find_login_form(html: &str, page_url: &Url) -> Option<LoginForm> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").ok()?;
    let password_selector = Selector::parse("input[type='password']").ok()?;

    let forms: Vec<ElementRef> = document.select(&form_selector).collect();
    let chosen = forms
        .iter()
        .find(|form| {
            form.value()
                .attr("action")
                .is_some_and(|action| action.contains("password-protected=login"))
        })
        .or_else(|| {
            forms
                .iter()
                .find(|form| form.select(&password_selector).next().is_some())
        })?;

    let action = match chosen.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => page_url.join(action).ok()?,
        _ => page_url.clone(),
    };

    let password_field = chosen
        .select(&password_selector)
        .next()
        .and_then(|input| input.value().attr("name"))
        .unwrap_or(DEFAULT_PASSWORD_FIELD)
        .to_string();

    let mut fields = Vec::new();
    if let Ok(input_selector) = Selector::parse("input[name]") {
        for input in chosen.select(&input_selector) {
            let element = input.value();
            let input_type = element.attr("type").unwrap_or("text").to_ascii_lowercase();
            let Some(name) = element.attr("name") else {
                continue;
            };
            if input_type == "password" || name == password_field {
                continue;
            }
            if matches!(input_type.as_str(), "checkbox" | "radio")
                && element.attr("checked").is_none()
            {
                continue;
            }
            fields.push((name.to_string(), element.attr("value").unwrap_or("").to_string()));
        }
    }

    Some(LoginForm {
        action,
        password_field,
        fields,
    })
}
