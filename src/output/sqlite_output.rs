//! SQLite-backed profile sink
//!
//! Writes every emitted profile into the storage backend under the current
//! run, and stamps the run with its outcome on finalize.

use crate::output::stats::RunOutcome;
use crate::output::traits::{OutputError, OutputResult, ProfileSink};
use crate::record::ProfileRecord;
use crate::storage::Storage;
use std::sync::{Arc, Mutex};

/// Shared handle to a storage backend
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// SQLite-based profile sink
pub struct SqliteSink {
    storage: SharedStorage,
    run_id: i64,
}

impl SqliteSink {
    /// Creates a sink writing into an already created run
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `run_id` - The current run ID
    pub fn new(storage: SharedStorage, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }
}

impl ProfileSink for SqliteSink {
    fn emit(&self, record: &ProfileRecord) -> OutputResult<()> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))?;

        storage
            .save_profile(self.run_id, record)
            .map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn finalize(&self, outcome: &RunOutcome) -> OutputResult<()> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))?;

        storage
            .complete_run(self.run_id, outcome)
            .map_err(|e| OutputError::Storage(e.to_string()))?;

        tracing::info!(
            "Run {} recorded as {}",
            self.run_id,
            outcome.status().to_db_string()
        );
        Ok(())
    }
}
