use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use profile_sieve::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/in/jane").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a domain matches a wildcard pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain of it.
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Returns true if `url` may be crawled under the allowed-domain list
///
/// An empty list allows every domain. A leading `www.` on the candidate is
/// ignored, so `"example.com"` also admits `www.example.com`.
pub fn is_allowed_domain(url: &Url, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let Some(domain) = extract_domain(url) else {
        return false;
    };
    let bare = domain.strip_prefix("www.").unwrap_or(&domain);

    allowed
        .iter()
        .any(|pattern| matches_wildcard(pattern, &domain) || matches_wildcard(pattern, bare))
}
