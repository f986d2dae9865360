//! Crawl requests and the interaction steps sent to the render backend

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// What kind of page a request renders, which decides where its document goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// A search results listing; routed to the pagination controller
    SearchPage,
    /// A single profile; routed to the extractor
    DetailPage,
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageKind::SearchPage => write!(f, "search"),
            PageKind::DetailPage => write!(f, "detail"),
        }
    }
}

/// A directive the render backend performs before returning the document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "selector", rename_all = "snake_case")]
pub enum InteractionStep {
    /// Wait until an element matching the selector is present
    WaitFor(String),
    /// Click the first element matching the selector
    Click(String),
}

/// Identity of a request for deduplication
///
/// Two requests are the same work item when they render the same normalized
/// URL, as the same kind of page, with the same interaction steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub url: String,
    pub kind: PageKind,
    pub steps: Vec<InteractionStep>,
}

/// One unit of work for the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub url: Url,
    pub kind: PageKind,
    pub steps: Vec<InteractionStep>,
    /// Failed attempts so far
    pub attempt: u32,
    /// Number of "next" clicks from the seed search page (0 for detail pages)
    pub page_index: u32,
}

impl CrawlRequest {
    /// Builds the seed request for a search feed
    pub fn search(url: Url, result_list_selector: &str) -> Self {
        Self {
            url,
            kind: PageKind::SearchPage,
            steps: vec![InteractionStep::WaitFor(result_list_selector.to_string())],
            attempt: 0,
            page_index: 0,
        }
    }

    /// Builds a request for a profile page
    pub fn detail(url: Url) -> Self {
        Self {
            url,
            kind: PageKind::DetailPage,
            steps: Vec::new(),
            attempt: 0,
            page_index: 0,
        }
    }

    /// Builds the request that advances this search page by one
    ///
    /// The previous steps are replayed before the click, so a stateless
    /// render backend still lands on the right page.
    pub fn advance(&self, next_selector: &str, result_list_selector: &str) -> Self {
        let mut steps = self.steps.clone();
        steps.push(InteractionStep::Click(next_selector.to_string()));
        steps.push(InteractionStep::WaitFor(result_list_selector.to_string()));

        Self {
            url: self.url.clone(),
            kind: PageKind::SearchPage,
            steps,
            attempt: 0,
            page_index: self.page_index + 1,
        }
    }

    /// Returns the same request with the attempt count incremented
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }

    /// Returns the deduplication key for this request
    pub fn key(&self) -> RequestKey {
        let url = crate::url::normalize_url(self.url.as_str())
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.url.to_string());

        RequestKey {
            url,
            kind: self.kind,
            steps: self.steps.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_url() -> Url {
        Url::parse("https://example.com/search?keywords=x").unwrap()
    }

    #[test]
    fn test_seed_waits_for_results() {
        let request = CrawlRequest::search(search_url(), "ul.results");
        assert_eq!(request.kind, PageKind::SearchPage);
        assert_eq!(
            request.steps,
            vec![InteractionStep::WaitFor("ul.results".to_string())]
        );
        assert_eq!(request.attempt, 0);
    }

    #[test]
    fn test_advance_appends_click_and_wait() {
        let seed = CrawlRequest::search(search_url(), "ul.results");
        let next = seed.advance("button.next", "ul.results");

        assert_eq!(next.url, seed.url);
        assert_eq!(next.page_index, 1);
        assert_eq!(
            &next.steps[1..],
            &[
                InteractionStep::Click("button.next".to_string()),
                InteractionStep::WaitFor("ul.results".to_string()),
            ]
        );
        assert_ne!(seed.key(), next.key());
    }

    #[test]
    fn test_next_attempt_keeps_identity() {
        let request = CrawlRequest::detail(Url::parse("https://example.com/in/jane").unwrap());
        let retried = request.next_attempt().next_attempt();

        assert_eq!(retried.attempt, 2);
        assert_eq!(request.attempt, 0);
        assert_eq!(request.key(), retried.key());
    }

    #[test]
    fn test_key_uses_normalized_url() {
        let a = CrawlRequest::detail(Url::parse("https://www.example.com/in/jane/").unwrap());
        let b = CrawlRequest::detail(Url::parse("https://example.com/in/jane?trk=x").unwrap());
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_kind_is_part_of_key() {
        let url = search_url();
        let detail = CrawlRequest::detail(url.clone());
        let mut search = CrawlRequest::search(url, "ul");
        search.steps.clear();
        assert_ne!(detail.key(), search.key());
    }

    #[test]
    fn test_step_wire_format() {
        let json = serde_json::to_value(InteractionStep::Click("button".to_string())).unwrap();
        assert_eq!(json["action"], "click");
        assert_eq!(json["selector"], "button");

        let json = serde_json::to_value(InteractionStep::WaitFor("ul".to_string())).unwrap();
        assert_eq!(json["action"], "wait_for");
    }
}
