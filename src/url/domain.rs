use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_ripple::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Identity used to decide whether two URLs belong to the same site
///
/// The host is lowercased with any leading `www.` dropped. An explicit port
/// is part of the identity.
///
/// ```
/// use url::Url;
/// use seo_ripple::url::site_key;
///
/// let a = Url::parse("https://www.example.com/a").unwrap();
/// let b = Url::parse("http://example.com/b").unwrap();
/// assert_eq!(site_key(&a), site_key(&b));
/// ```
pub fn site_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Identity of a single page: site identity plus path and query
///
/// Scheme and a leading `www.` do not count, so `http://www.example.com/a`
/// and `https://example.com/a` are the same page. Expects a normalized URL;
/// a URL without a host is keyed by its full text.
///
/// ```
/// use url::Url;
/// use seo_ripple::url::page_key;
///
/// let a = Url::parse("http://www.example.com/a?x=1").unwrap();
/// assert_eq!(page_key(&a), "example.com/a?x=1");
/// ```
pub fn page_key(url: &Url) -> String {
    let Some(site) = site_key(url) else {
        return url.as_str().to_string();
    };
    match url.query() {
        Some(query) => format!("{}{}?{}", site, url.path(), query),
        None => format!("{}{}", site, url.path()),
    }
}

/// Makes a host safe for use inside a file name
///
/// Every character outside `[A-Za-z0-9.-]` becomes `_`.
pub fn sanitize_for_filename(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_site_key_strips_www() {
        let url = Url::parse("https://WWW.Example.com/page").unwrap();
        assert_eq!(site_key(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_site_key_keeps_subdomain() {
        let url = Url::parse("https://blog.example.com/").unwrap();
        assert_eq!(site_key(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_site_key_includes_port() {
        let url = Url::parse("http://127.0.0.1:4567/").unwrap();
        assert_eq!(site_key(&url), Some("127.0.0.1:4567".to_string()));
    }

    #[test]
    fn test_page_key_folds_scheme_and_www() {
        let plain = Url::parse("https://example.com/shop?page=2").unwrap();
        let www = Url::parse("http://www.example.com/shop?page=2").unwrap();
        assert_eq!(page_key(&plain), page_key(&www));
        assert_eq!(page_key(&plain), "example.com/shop?page=2");

        let other_port = Url::parse("https://example.com:8443/shop?page=2").unwrap();
        assert_ne!(page_key(&plain), page_key(&other_port));
    }

    #[test]
    fn test_sanitize_for_filename() {
        assert_eq!(sanitize_for_filename("example.com"), "example.com");
        assert_eq!(sanitize_for_filename("127.0.0.1:8080"), "127.0.0.1_8080");
        assert_eq!(sanitize_for_filename("shop/ü"), "shop__");
    }
}
