//! Storage traits and error types

use crate::output::RunOutcome;
use crate::record::ProfileRecord;
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Stamps a run with its finish time, final status and counters
    fn complete_run(&mut self, run_id: i64, outcome: &RunOutcome) -> StorageResult<()>;

    /// Counts recorded runs
    fn count_runs(&self) -> StorageResult<u64>;

    // ===== Profiles =====

    /// Inserts a profile, replacing any earlier row with the same URL
    fn save_profile(&mut self, run_id: i64, record: &ProfileRecord) -> StorageResult<()>;

    /// Gets a stored profile by URL
    fn get_profile(&self, profile_url: &str) -> StorageResult<Option<ProfileRecord>>;

    /// Loads every profile written by one run, in insertion order
    fn load_profiles(&self, run_id: i64) -> StorageResult<Vec<ProfileRecord>>;

    /// Counts stored profiles across all runs
    fn count_profiles(&self) -> StorageResult<u64>;
}
