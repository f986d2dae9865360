//! Pagination controller for rendered search result pages
//!
//! Turns one rendered search page into the requests that follow from it:
//! one detail request per result entry with a usable profile link, plus at
//! most one request that advances the feed to the next page.

use crate::config::SelectorSet;
use crate::crawler::fetcher::RenderedDocument;
use crate::crawler::request::CrawlRequest;
use crate::url::{is_allowed_domain, resolve_link};
use scraper::{ElementRef, Html};
use std::sync::Arc;

/// Requests produced from one search page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextActions {
    /// Profile pages to extract, in result order
    pub detail_requests: Vec<CrawlRequest>,
    /// The next search page, if the feed has one
    pub advance_request: Option<CrawlRequest>,
}

impl NextActions {
    /// Returns every request in enqueue order: details first, then the advance
    pub fn into_requests(self) -> Vec<CrawlRequest> {
        let mut requests = self.detail_requests;
        requests.extend(self.advance_request);
        requests
    }
}

/// Decides what to crawl after a search page
#[derive(Debug, Clone)]
pub struct PaginationController {
    selectors: Arc<SelectorSet>,
    allowed_domains: Vec<String>,
}

impl PaginationController {
    pub fn new(selectors: Arc<SelectorSet>, allowed_domains: Vec<String>) -> Self {
        Self {
            selectors,
            allowed_domains,
        }
    }

    /// Computes the follow-up requests for a rendered search page
    ///
    /// Entries without a resolvable, allowed profile link are skipped. The
    /// feed ends only when no enabled next-page control is present; a page
    /// with zero usable entries still advances if the control is there.
    pub fn next_actions(&self, document: &RenderedDocument, request: &CrawlRequest) -> NextActions {
        let html = Html::parse_document(&document.html);

        let detail_requests = html
            .select(&self.selectors.result_entry)
            .filter_map(|entry| self.profile_link(entry, document))
            .map(CrawlRequest::detail)
            .collect();

        let advance_request = self.has_enabled_next(&html).then(|| {
            request.advance(
                &self.selectors.source.next_button,
                &self.selectors.source.result_list,
            )
        });

        NextActions {
            detail_requests,
            advance_request,
        }
    }

    /// Resolves the profile link of one result entry
    fn profile_link(&self, entry: ElementRef<'_>, document: &RenderedDocument) -> Option<url::Url> {
        let href = entry
            .select(&self.selectors.profile_link)
            .find_map(|link| link.value().attr("href"))?;

        let url = resolve_link(href, &document.url)?;

        if !is_allowed_domain(&url, &self.allowed_domains) {
            tracing::debug!("Skipping off-site profile link {}", url);
            return None;
        }

        Some(url)
    }

    /// Returns true if a next-page control exists and is not disabled
    fn has_enabled_next(&self, html: &Html) -> bool {
        html.select(&self.selectors.next_button).any(|button| {
            let element = button.value();
            element.attr("disabled").is_none() && element.attr("aria-disabled") != Some("true")
        })
    }
}
