//! Crawler module for rendering and processing pages
//!
//! This module contains the core crawling logic, including:
//! - Rendering pages through an external render service
//! - Following search result pagination
//! - Extracting profile records from detail pages
//! - Retry decisions and the pending work queue
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod pagination;
mod request;
mod retry;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::Extractor;
pub use fetcher::{HttpRenderClient, RenderClient, RenderedDocument};
pub use pagination::{NextActions, PaginationController};
pub use request::{CrawlRequest, InteractionStep, PageKind, RequestKey};
pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::WorkQueue;
