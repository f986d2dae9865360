//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Dequeuing pending requests onto a bounded pool of render tasks
//! - Routing rendered search pages to pagination and profiles to extraction
//! - Scheduling retries with backoff after failed renders
//! - Emitting records to the sink and keeping run statistics
//! - Stopping on cancellation

use crate::config::{Config, SelectorSet};
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::RenderClient;
use crate::crawler::pagination::{NextActions, PaginationController};
use crate::crawler::request::{CrawlRequest, PageKind};
use crate::crawler::retry::{RetryDecision, RetryPolicy};
use crate::crawler::scheduler::WorkQueue;
use crate::output::{ProfileSink, RunOutcome, RunStats};
use crate::record::ProfileRecord;
use crate::{FetchError, SieveError};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a worker produced from one rendered page
#[derive(Debug)]
enum PageOutput {
    /// Follow-up requests from a search page
    Follow(NextActions),
    /// Records extracted from a profile page
    Records(Vec<ProfileRecord>),
}

/// Completion of a task in the worker pool
#[derive(Debug)]
enum Event {
    Rendered {
        request: CrawlRequest,
        result: Result<PageOutput, FetchError>,
    },
    RetryReady(CrawlRequest),
}

/// Main crawler coordinator structure
///
/// The coordinator owns the work queue and is the only place requests are
/// enqueued or records emitted. Render calls run concurrently on a
/// `JoinSet`; parsing happens inside those tasks so the coordinator only
/// sees finished results.
pub struct Coordinator {
    client: Arc<dyn RenderClient>,
    sink: Arc<dyn ProfileSink>,
    stats: Arc<RunStats>,
    retry: RetryPolicy,
    pagination: Arc<PaginationController>,
    extractor: Arc<Extractor>,
    queue: WorkQueue,
    max_concurrency: usize,
    max_search_pages: u32,
    progress_interval: u64,
}

impl Coordinator {
    /// Creates a coordinator with default limits
    ///
    /// # Arguments
    ///
    /// * `client` - The render backend
    /// * `sink` - Destination for extracted records
    /// * `selectors` - Compiled page selectors
    /// * `target_country` - Country education entries must mention
    /// * `allowed_domains` - Domains profile links may point to (empty allows all)
    pub fn new(
        client: Arc<dyn RenderClient>,
        sink: Arc<dyn ProfileSink>,
        selectors: Arc<SelectorSet>,
        target_country: &str,
        allowed_domains: Vec<String>,
    ) -> Self {
        Self {
            client,
            sink,
            stats: Arc::new(RunStats::new()),
            retry: RetryPolicy::default(),
            pagination: Arc::new(PaginationController::new(
                Arc::clone(&selectors),
                allowed_domains,
            )),
            extractor: Arc::new(Extractor::new(selectors, target_country)),
            queue: WorkQueue::new(),
            max_concurrency: 6,
            max_search_pages: 100,
            progress_interval: 10,
        }
    }

    /// Creates a coordinator from a validated configuration
    pub fn from_config(
        config: &Config,
        client: Arc<dyn RenderClient>,
        sink: Arc<dyn ProfileSink>,
    ) -> Result<Self, SieveError> {
        let selectors = Arc::new(SelectorSet::compile(&config.selectors)?);

        Ok(Self::new(
            client,
            sink,
            selectors,
            &config.filter.target_country,
            config.crawler.allowed_domains.clone(),
        )
        .with_retry_policy(RetryPolicy::from_config(&config.retry))
        .with_max_concurrency(config.crawler.max_concurrent_requests as usize)
        .with_max_search_pages(config.crawler.max_search_pages)
        .with_progress_interval(config.crawler.progress_interval))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Caps how many search pages (seed included) are rendered
    pub fn with_max_search_pages(mut self, max_search_pages: u32) -> Self {
        self.max_search_pages = max_search_pages.max(1);
        self
    }

    /// Logs progress every `interval` rendered pages
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Runs the crawl from a seed request until the queue drains or the
    /// token is cancelled
    ///
    /// The sink is not finalized here; the caller decides when its output
    /// is complete.
    pub async fn run(mut self, seed: CrawlRequest, cancel: CancellationToken) -> RunOutcome {
        tracing::info!("Starting crawl at {}", seed.url);
        let start_time = Instant::now();

        self.queue.push(seed);

        let mut tasks: JoinSet<Event> = JoinSet::new();
        let mut in_flight = 0usize;
        let mut pages_processed = 0u64;

        let cancelled = loop {
            while in_flight < self.max_concurrency {
                let Some(request) = self.queue.pop() else {
                    break;
                };
                self.spawn_render(&mut tasks, request);
                in_flight += 1;
            }

            if tasks.is_empty() {
                break false;
            }

            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => break true,
                joined = tasks.join_next() => joined,
            };

            let event = match joined {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    // Timer tasks only sleep, so a failed task was a render
                    in_flight -= 1;
                    self.stats.record_permanent_failure();
                    tracing::error!("Render task failed: {}", e);
                    continue;
                }
                None => break false,
            };

            match event {
                Event::Rendered { request, result } => {
                    in_flight -= 1;
                    pages_processed += 1;
                    self.handle_rendered(&mut tasks, request, result);

                    if pages_processed % self.progress_interval == 0 {
                        let elapsed = start_time.elapsed();
                        tracing::info!(
                            "Progress: {} pages processed, {} profiles, {} queued, {:.2} pages/sec",
                            pages_processed,
                            self.stats.profiles_emitted(),
                            self.queue.len(),
                            pages_processed as f64 / elapsed.as_secs_f64()
                        );
                    }
                }
                Event::RetryReady(request) => {
                    tracing::debug!(
                        "Retrying {} (attempt {})",
                        request.url,
                        request.attempt + 1
                    );
                    self.queue.push_retry(request);
                }
            }
        };

        if cancelled {
            tracing::warn!(
                "Crawl cancelled; abandoning {} in-flight renders and {} queued requests",
                in_flight,
                self.queue.len()
            );
            tasks.abort_all();
        }

        let outcome = RunOutcome::new(self.stats.snapshot(), cancelled);

        tracing::info!(
            "Crawl {}: {} profiles from {} pages in {:?}",
            outcome.status().to_db_string(),
            outcome.stats.profiles_emitted,
            outcome.stats.pages_rendered,
            start_time.elapsed()
        );
        if outcome.empty_run {
            tracing::warn!("No profiles scraped");
        }

        outcome
    }

    /// Starts rendering one request on the pool
    fn spawn_render(&self, tasks: &mut JoinSet<Event>, request: CrawlRequest) {
        let client = Arc::clone(&self.client);
        let pagination = Arc::clone(&self.pagination);
        let extractor = Arc::clone(&self.extractor);

        tracing::debug!("Rendering {} page {}", request.kind, request.url);

        tasks.spawn(async move {
            let result = client
                .fetch(&request.url, &request.steps)
                .await
                .map(|document| match request.kind {
                    PageKind::SearchPage => {
                        PageOutput::Follow(pagination.next_actions(&document, &request))
                    }
                    PageKind::DetailPage => {
                        PageOutput::Records(extractor.extract(&document, request.url.as_str()))
                    }
                });

            Event::Rendered { request, result }
        });
    }

    fn handle_rendered(
        &mut self,
        tasks: &mut JoinSet<Event>,
        request: CrawlRequest,
        result: Result<PageOutput, FetchError>,
    ) {
        match result {
            Ok(PageOutput::Follow(actions)) => {
                self.stats.record_render();
                tracing::debug!(
                    "Search page {} yielded {} profile links",
                    request.page_index,
                    actions.detail_requests.len()
                );
                self.enqueue_all(actions.into_requests());
            }
            Ok(PageOutput::Records(records)) => {
                self.stats.record_render();
                self.emit_all(&records);
            }
            Err(error) => self.handle_failure(tasks, request, error),
        }
    }

    fn enqueue_all(&mut self, requests: Vec<CrawlRequest>) {
        for request in requests {
            if request.kind == PageKind::SearchPage && request.page_index >= self.max_search_pages
            {
                tracing::warn!(
                    "Reached the limit of {} search pages; not advancing further",
                    self.max_search_pages
                );
                continue;
            }

            if !self.queue.push(request) {
                self.stats.record_duplicate();
            }
        }
    }

    fn emit_all(&self, records: &[ProfileRecord]) {
        for record in records {
            self.stats.record_profile();
            match self.sink.emit(record) {
                Ok(()) => {
                    tracing::debug!(
                        "Emitted {} ({} matching educations)",
                        record.profile_url,
                        record.educations.len()
                    );
                }
                Err(e) => {
                    self.stats.record_sink_error();
                    tracing::error!("Failed to write {}: {}", record.profile_url, e);
                }
            }
        }
    }

    fn handle_failure(
        &mut self,
        tasks: &mut JoinSet<Event>,
        request: CrawlRequest,
        error: FetchError,
    ) {
        match self.retry.decide(request.attempt) {
            RetryDecision::RetryAfter(delay) => {
                self.stats.record_retry();
                tracing::warn!("{}; retrying in {:?}", error, delay);

                let retry = request.next_attempt();
                tasks.spawn(async move {
                    tokio::time::sleep(delay).await;
                    Event::RetryReady(retry)
                });
            }
            RetryDecision::GiveUp => {
                self.stats.record_permanent_failure();
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    request.url,
                    request.attempt + 1,
                    error.cause
                );
            }
        }
    }
}

/// Runs a complete crawl described by a configuration
///
/// Seeds the queue with the configured search URL, runs the coordinator, and
/// finalizes the sink with the outcome. A sink that fails to finalize is
/// logged; the outcome is still returned.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `client` - The render backend
/// * `sink` - Destination for extracted records
/// * `cancel` - Token that stops the crawl early
pub async fn run_crawl(
    config: &Config,
    client: Arc<dyn RenderClient>,
    sink: Arc<dyn ProfileSink>,
    cancel: CancellationToken,
) -> Result<RunOutcome, SieveError> {
    let seed_url = Url::parse(&config.crawler.search_url)?;
    let seed = CrawlRequest::search(seed_url, &config.selectors.result_list);

    let coordinator = Coordinator::from_config(config, client, Arc::clone(&sink))?;
    let outcome = coordinator.run(seed, cancel).await;

    if let Err(e) = sink.finalize(&outcome) {
        tracing::error!("Failed to finalize output: {}", e);
    }

    Ok(outcome)
}
