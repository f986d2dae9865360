use crate::UrlError;
use url::Url;

/// Query keys that only carry click or referral tracking
const TRACKING_PARAMS: &[&str] = &[
    "trk",
    "trackingId",
    "lipi",
    "miniProfileUrn",
    "originalSubdomain",
    "fbclid",
    "gclid",
    "ref",
];

/// Reduces a URL to the form used as a request deduplication key
///
/// The host is lowercased and loses a leading `www.`, the fragment and any
/// trailing slash are dropped, and tracking query keys are removed. The
/// remaining query is kept in its original order, so two search URLs only
/// collide when they ask for the same results. The scheme is kept.
///
/// # Examples
///
/// ```
/// use profile_sieve::url::normalize_url;
///
/// let url = normalize_url("https://WWW.EXAMPLE.COM/in/jane/?trk=feed").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/in/jane");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_ascii_lowercase();
    if let Some(bare) = host.strip_prefix("www.") {
        url.set_host(Some(bare))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    url.set_fragment(None);

    let trimmed = url.path().trim_end_matches('/').to_string();
    if !trimmed.is_empty() {
        url.set_path(&trimmed);
    }

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&kept);
        }
    }

    Ok(url)
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> String {
        normalize_url(s).unwrap().to_string()
    }

    #[test]
    fn test_profile_link_variants_share_a_key() {
        let expected = "https://example.com/in/jane-doe";
        for variant in [
            "https://example.com/in/jane-doe",
            "https://www.example.com/in/jane-doe/",
            "https://WWW.Example.com/in/jane-doe?trk=public_profile",
            "https://example.com/in/jane-doe/?miniProfileUrn=urn%3Ali%3Afs&lipi=abc",
            "https://example.com/in/jane-doe#experience",
            "https://example.com/in/jane-doe?originalSubdomain=fr",
        ] {
            assert_eq!(key(variant), expected, "variant: {}", variant);
        }
    }

    #[test]
    fn test_profile_path_case_is_kept() {
        assert_ne!(
            key("https://example.com/in/Jane-Doe"),
            key("https://example.com/in/jane-doe")
        );
    }

    #[test]
    fn test_search_query_is_kept_in_order() {
        assert_eq!(
            key("https://www.example.com/search/results/people/?keywords=rust&page=2&utm_campaign=x"),
            "https://example.com/search/results/people?keywords=rust&page=2"
        );
    }

    #[test]
    fn test_different_search_pages_stay_distinct() {
        assert_ne!(
            key("https://example.com/search/results/people/?keywords=rust&page=1"),
            key("https://example.com/search/results/people/?keywords=rust&page=2")
        );
    }

    #[test]
    fn test_root_keeps_its_slash() {
        assert_eq!(key("https://www.example.com"), "https://example.com/");
    }

    #[test]
    fn test_local_http_scheme_is_kept() {
        assert_eq!(key("http://127.0.0.1:8080/in/jane/"), "http://127.0.0.1:8080/in/jane");
    }

    #[test]
    fn test_rejects_non_http() {
        assert!(matches!(
            normalize_url("ftp://example.com/in/jane"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
    }
}
