//! URL handling module for Profile-Sieve
//!
//! This module provides link resolution, URL normalization for
//! deduplication, and allowed-domain matching.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_allowed_domain, matches_wildcard};
pub use normalize::normalize_url;

use url::Url;

/// Resolves an href found on a page to an absolute HTTP(S) URL
///
/// Returns None if the link should be skipped:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - hrefs that do not resolve against the base URL
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/search/results/people/?keywords=x").unwrap()
    }

    #[test]
    fn test_resolve_absolute_link() {
        let resolved = resolve_link("https://other.com/in/jane", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://other.com/in/jane");
    }

    #[test]
    fn test_resolve_root_relative_link() {
        let resolved = resolve_link("/in/jane", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/in/jane");
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        let resolved = resolve_link("  /in/jane \n", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/in/jane");
    }

    #[test]
    fn test_skip_special_schemes() {
        assert!(resolve_link("javascript:void(0)", &base_url()).is_none());
        assert!(resolve_link("mailto:jane@example.com", &base_url()).is_none());
        assert!(resolve_link("tel:+331234", &base_url()).is_none());
        assert!(resolve_link("data:text/html,<p>x</p>", &base_url()).is_none());
    }

    #[test]
    fn test_skip_empty_and_fragment() {
        assert!(resolve_link("", &base_url()).is_none());
        assert!(resolve_link("   ", &base_url()).is_none());
        assert!(resolve_link("#top", &base_url()).is_none());
    }

    #[test]
    fn test_skip_non_http_after_resolution() {
        assert!(resolve_link("ftp://example.com/file", &base_url()).is_none());
    }
}
