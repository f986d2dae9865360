//! Output sink trait and error types
//!
//! Sinks receive each extracted profile exactly once, in extraction order
//! for a given page, and are finalized with the run outcome after the crawl.

use crate::output::stats::RunOutcome;
use crate::record::ProfileRecord;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted profiles
///
/// Implementations must be thread-safe; the coordinator holds them behind
/// an `Arc` and calls them from its own task.
pub trait ProfileSink: Send + Sync {
    /// Records one extracted profile
    fn emit(&self, record: &ProfileRecord) -> OutputResult<()>;

    /// Flushes and closes the output once the run is over
    ///
    /// # Arguments
    ///
    /// * `outcome` - The final outcome of the crawl run
    fn finalize(&self, outcome: &RunOutcome) -> OutputResult<()>;
}

impl<T: ProfileSink + ?Sized> ProfileSink for Arc<T> {
    fn emit(&self, record: &ProfileRecord) -> OutputResult<()> {
        (**self).emit(record)
    }

    fn finalize(&self, outcome: &RunOutcome) -> OutputResult<()> {
        (**self).finalize(outcome)
    }
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ProfileRecord>>,
    outcome: Mutex<Option<RunOutcome>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record emitted so far
    pub fn records(&self) -> Vec<ProfileRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Returns the outcome passed to `finalize`, if it has been called
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome.lock().ok().and_then(|outcome| *outcome)
    }
}

impl ProfileSink for MemorySink {
    fn emit(&self, record: &ProfileRecord) -> OutputResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock records: {}", e)))?;
        records.push(record.clone());
        Ok(())
    }

    fn finalize(&self, outcome: &RunOutcome) -> OutputResult<()> {
        let mut slot = self
            .outcome
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock outcome: {}", e)))?;
        *slot = Some(*outcome);
        Ok(())
    }
}

/// Fans every call out to several sinks
///
/// All sinks are called even when one fails; the first error is returned.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn ProfileSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ProfileSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ProfileSink for MultiSink {
    fn emit(&self, record: &ProfileRecord) -> OutputResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(record) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn finalize(&self, outcome: &RunOutcome) -> OutputResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.finalize(outcome) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
