//! Run statistics and the final run outcome
//!
//! `RunStats` is the only counter state shared during a crawl. Every field is
//! an atomic so each update is a single indivisible mutation no matter how
//! many workers finish at once.

use crate::storage::RunStatus;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide crawl counters
#[derive(Debug, Default)]
pub struct RunStats {
    profiles_emitted: AtomicU64,
    requests_failed_permanently: AtomicU64,
    pages_rendered: AtomicU64,
    retries_scheduled: AtomicU64,
    duplicates_skipped: AtomicU64,
    sink_errors: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_profile(&self) {
        self.profiles_emitted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_permanent_failure(&self) {
        self.requests_failed_permanently
            .fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_render(&self) {
        self.pages_rendered.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_retry(&self) {
        self.retries_scheduled.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn profiles_emitted(&self) -> u64 {
        self.profiles_emitted.load(Ordering::SeqCst)
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            profiles_emitted: self.profiles_emitted.load(Ordering::SeqCst),
            requests_failed_permanently: self.requests_failed_permanently.load(Ordering::SeqCst),
            pages_rendered: self.pages_rendered.load(Ordering::SeqCst),
            retries_scheduled: self.retries_scheduled.load(Ordering::SeqCst),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::SeqCst),
            sink_errors: self.sink_errors.load(Ordering::SeqCst),
        }
    }
}

/// Plain copy of `RunStats` at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatsSnapshot {
    pub profiles_emitted: u64,
    pub requests_failed_permanently: u64,
    pub pages_rendered: u64,
    pub retries_scheduled: u64,
    pub duplicates_skipped: u64,
    pub sink_errors: u64,
}

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub stats: RunStatsSnapshot,
    /// No profile was emitted; the run produced nothing useful
    pub empty_run: bool,
    /// The run stopped on the cancellation token before the queue drained
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn new(stats: RunStatsSnapshot, cancelled: bool) -> Self {
        Self {
            stats,
            empty_run: stats.profiles_emitted == 0,
            cancelled,
        }
    }

    /// A run succeeds when it emitted at least one profile
    pub fn is_success(&self) -> bool {
        !self.empty_run
    }

    /// Status recorded for the run
    pub fn status(&self) -> RunStatus {
        match (self.cancelled, self.empty_run) {
            (true, _) => RunStatus::Cancelled,
            (false, true) => RunStatus::Empty,
            (false, false) => RunStatus::Completed,
        }
    }
}

/// Prints a run outcome to stdout in a formatted manner
pub fn print_outcome(outcome: &RunOutcome) {
    let stats = &outcome.stats;

    println!("=== Crawl Outcome ===\n");
    println!("  Status: {}", outcome.status().to_db_string());
    println!("  Profiles emitted: {}", stats.profiles_emitted);
    println!("  Pages rendered: {}", stats.pages_rendered);
    println!("  Retries scheduled: {}", stats.retries_scheduled);
    println!(
        "  Requests failed permanently: {}",
        stats.requests_failed_permanently
    );
    println!("  Duplicate requests skipped: {}", stats.duplicates_skipped);
    if stats.sink_errors > 0 {
        println!("  Sink write errors: {}", stats.sink_errors);
    }

    if outcome.empty_run {
        println!("\nNo profiles scraped; the feed or its markup may have changed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = RunStats::new();
        assert_eq!(stats.snapshot(), RunStatsSnapshot::default());
    }

    #[test]
    fn test_snapshot_reflects_updates() {
        let stats = RunStats::new();
        stats.record_profile();
        stats.record_profile();
        stats.record_permanent_failure();
        stats.record_render();
        stats.record_retry();
        stats.record_duplicate();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.profiles_emitted, 2);
        assert_eq!(snapshot.requests_failed_permanently, 1);
        assert_eq!(snapshot.pages_rendered, 1);
        assert_eq!(snapshot.retries_scheduled, 1);
        assert_eq!(snapshot.duplicates_skipped, 1);
        assert_eq!(snapshot.sink_errors, 0);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let stats = Arc::new(RunStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_profile();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.profiles_emitted(), 8000);
    }

    #[test]
    fn test_outcome_empty_run() {
        let outcome = RunOutcome::new(RunStatsSnapshot::default(), false);
        assert!(outcome.empty_run);
        assert!(!outcome.is_success());
        assert_eq!(outcome.status(), RunStatus::Empty);
    }

    #[test]
    fn test_outcome_success() {
        let stats = RunStatsSnapshot {
            profiles_emitted: 3,
            ..RunStatsSnapshot::default()
        };
        let outcome = RunOutcome::new(stats, false);
        assert!(outcome.is_success());
        assert_eq!(outcome.status(), RunStatus::Completed);
    }

    #[test]
    fn test_outcome_cancelled() {
        let stats = RunStatsSnapshot {
            profiles_emitted: 1,
            ..RunStatsSnapshot::default()
        };
        let outcome = RunOutcome::new(stats, true);
        assert!(outcome.cancelled);
        assert!(!outcome.empty_run);
        assert_eq!(outcome.status(), RunStatus::Cancelled);
    }
}
