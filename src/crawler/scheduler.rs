//! Pending work queue for the crawl
//!
//! This module handles:
//! - FIFO ordering of pending crawl requests
//! - Deduplication of new requests by normalized URL, page kind and steps
//! - Re-admitting retries, which are the same work item and skip the check

use crate::crawler::request::{CrawlRequest, RequestKey};
use std::collections::{HashSet, VecDeque};

/// FIFO queue of crawl requests with a seen-set
///
/// A request is admitted once per key for the lifetime of the queue, even
/// after it has been popped, so a profile linked from several search pages
/// is rendered only once.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: VecDeque<CrawlRequest>,
    seen: HashSet<RequestKey>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new request to the back of the queue
    ///
    /// # Returns
    ///
    /// * `true` - The request was queued
    /// * `false` - A request with the same key was already admitted
    pub fn push(&mut self, request: CrawlRequest) -> bool {
        if !self.seen.insert(request.key()) {
            tracing::trace!("Skipping duplicate {} request {}", request.kind, request.url);
            return false;
        }

        self.pending.push_back(request);
        true
    }

    /// Re-queues a request whose backoff has elapsed
    pub fn push_retry(&mut self, request: CrawlRequest) {
        self.pending.push_back(request);
    }

    /// Takes the oldest pending request
    pub fn pop(&mut self) -> Option<CrawlRequest> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn detail(url: &str) -> CrawlRequest {
        CrawlRequest::detail(Url::parse(url).unwrap())
    }

    #[test]
    fn test_new_queue_is_empty() {
        let mut queue = WorkQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = WorkQueue::new();
        assert!(queue.push(detail("https://example.com/in/a")));
        assert!(queue.push(detail("https://example.com/in/b")));
        assert!(queue.push(detail("https://example.com/in/c")));

        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(order, vec!["/in/a", "/in/b", "/in/c"]);
    }

    #[test]
    fn test_duplicates_rejected_after_pop() {
        let mut queue = WorkQueue::new();
        assert!(queue.push(detail("https://www.example.com/in/a")));
        queue.pop();

        assert!(!queue.push(detail("https://example.com/in/a/")));
        assert!(!queue.push(detail("https://example.com/in/a?trk=feed")));
        assert!(queue.is_empty());

        assert!(queue.push(detail("https://example.com/in/b")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_same_url_different_kind_or_steps_is_distinct() {
        let seed = CrawlRequest::search(
            Url::parse("https://example.com/search").unwrap(),
            "ul.results",
        );
        let mut queue = WorkQueue::new();

        assert!(queue.push(seed.clone()));
        assert!(queue.push(seed.advance("button.next", "ul.results")));
        assert!(queue.push(detail("https://example.com/search")));
        assert!(!queue.push(seed.advance("button.next", "ul.results")));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_retry_bypasses_dedup() {
        let mut queue = WorkQueue::new();
        let request = detail("https://example.com/in/a");
        queue.push(request.clone());
        let popped = queue.pop().unwrap();

        queue.push_retry(popped.next_attempt());
        let retried = queue.pop().unwrap();
        assert_eq!(retried.attempt, 1);
        assert_eq!(retried.url, request.url);
    }
}
