use crate::result::{ExternalLink, PageLinks};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Strips the fragment and any trailing slashes, giving a page its identity
/// for visitation.
pub fn normalize_page_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.trim_end_matches('/').to_string()
}

/// Host plus explicit port, as it appears in the URL
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Last two dot-separated labels of the authority: `example.com` for
/// `https://www.example.com/`.
pub fn registrable_domain(url: &Url) -> Option<String> {
    let authority = authority(url)?;
    let labels: Vec<&str> = authority.split('.').collect();
    let start = labels.len().saturating_sub(2);
    Some(labels[start..].join("."))
}

/// Site membership test. This is a substring match, so `evil-example.com`
/// counts as part of `example.com`.
pub fn is_same_site(domain: &str, link: &Url) -> bool {
    authority(link).is_some_and(|a| a.contains(domain))
}

/// Collects every `a[href]` on the page and splits the resolved links into
/// internal pages and external link pairs.
pub fn extract_links(page_url: &str, html: &str) -> PageLinks {
    let mut links = PageLinks::default();

    let Ok(base) = Url::parse(page_url) else {
        return links;
    };
    let Some(domain) = registrable_domain(&base) else {
        return links;
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    let source_page = normalize_page_url(page_url);
    let document = Html::parse_document(html);

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href.trim()) else {
            continue;
        };
        // mailto:, javascript:, tel: and friends have no host
        if resolved.host_str().is_none() {
            continue;
        }

        if is_same_site(&domain, &resolved) {
            links.internal.insert(normalize_page_url(resolved.as_str()));
        } else {
            debug!("External link {} on {}", resolved, source_page);
            links
                .external
                .insert(ExternalLink::new(source_page.clone(), resolved.to_string()));
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_normalize_page_url() {
        assert_eq!(normalize_page_url("https://example.com/"), "https://example.com");
        assert_eq!(
            normalize_page_url("https://example.com/docs/#intro"),
            "https://example.com/docs"
        );
        assert_eq!(
            normalize_page_url("https://example.com/a//"),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_page_url("https://example.com/a?x=1"),
            "https://example.com/a?x=1"
        );
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(
            registrable_domain(&url("https://www.example.com/page")).as_deref(),
            Some("example.com")
        );
        assert_eq!(
            registrable_domain(&url("https://a.b.example.co.uk/")).as_deref(),
            Some("co.uk")
        );
        assert_eq!(
            registrable_domain(&url("http://localhost:8080/")).as_deref(),
            Some("localhost:8080")
        );
        assert_eq!(
            registrable_domain(&url("http://127.0.0.1:3000/")).as_deref(),
            Some("0.1:3000")
        );
        assert_eq!(registrable_domain(&url("mailto:someone@example.com")), None);
    }

    #[test]
    fn test_same_site_is_substring_based() {
        assert!(is_same_site("example.com", &url("https://blog.example.com/")));
        assert!(is_same_site("example.com", &url("http://example.com/x")));
        assert!(is_same_site("example.com", &url("https://evil-example.com/")));
        assert!(!is_same_site("example.com", &url("https://example.org/")));
        assert!(!is_same_site("0.1:3000", &url("http://127.0.0.1:4000/")));
    }

    #[test]
    fn test_extract_links_classifies_and_normalizes() {
        let html = r##"<html><body>
            <a href="/about/">About</a>
            <a href="contact#form">Contact</a>
            <a href="https://blog.example.com/post/">Blog</a>
            <a href="https://other.org/page#top">Other</a>
            <a href="mailto:hello@example.com">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a>No href</a>
        </body></html>"##;

        let links = extract_links("https://www.example.com/#hero", html);

        let mut internal: Vec<_> = links.internal.iter().cloned().collect();
        internal.sort();
        assert_eq!(
            internal,
            vec![
                "https://blog.example.com/post".to_string(),
                "https://www.example.com/about".to_string(),
                "https://www.example.com/contact".to_string(),
            ]
        );

        assert_eq!(links.external.len(), 1);
        let external = links.external.iter().next().unwrap();
        assert_eq!(external.page, "https://www.example.com");
        // The target keeps its fragment
        assert_eq!(external.target, "https://other.org/page#top");
    }

    #[test]
    fn test_extract_links_deduplicates_per_page() {
        let html = r#"<a href="https://other.org/">one</a><a href="https://other.org/">two</a>
            <a href="/x">x</a><a href="/x/">x again</a>"#;
        let links = extract_links("https://example.com/page", html);
        assert_eq!(links.external.len(), 1);
        assert_eq!(links.internal.len(), 1);
    }

    #[test]
    fn test_extract_links_bad_base_yields_nothing() {
        let links = extract_links("not a url", r#"<a href="https://other.org/">x</a>"#);
        assert!(links.internal.is_empty());
        assert!(links.external.is_empty());
    }
}
