//! Output module for extracted profiles and run results
//!
//! This module handles:
//! - The `ProfileSink` trait and its JSON Lines, SQLite and in-memory sinks
//! - Run counters and the final run outcome
//! - Printing outcomes and stored history

mod jsonl;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use sqlite_output::{SharedStorage, SqliteSink};
pub use stats::{print_outcome, RunOutcome, RunStats, RunStatsSnapshot};
pub use traits::{MemorySink, MultiSink, OutputError, OutputResult, ProfileSink};

use crate::config::OutputConfig;
use crate::storage::{open_storage, Storage};
use crate::SieveError;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Opens every sink named in the output configuration
///
/// The JSON Lines sink is always present. When a database path is set, a new
/// run is created there and a `SqliteSink` writes into it.
///
/// # Arguments
///
/// * `output` - The `[output]` configuration section
/// * `config_hash` - Hash of the configuration file, stored with the run
pub fn open_sinks(output: &OutputConfig, config_hash: &str) -> Result<MultiSink, SieveError> {
    let mut sinks = MultiSink::new().with(JsonLinesSink::open(Path::new(&output.jsonl_path))?);

    if let Some(db_path) = &output.database_path {
        let mut storage = open_storage(Path::new(db_path))?;
        let run_id = storage.create_run(config_hash)?;
        tracing::info!("Recording run {} in {}", run_id, db_path);

        let shared: SharedStorage = Arc::new(Mutex::new(storage));
        sinks = sinks.with(SqliteSink::new(shared, run_id));
    }

    Ok(sinks)
}

/// Prints the stored run history of a database to stdout
pub fn print_history(storage: &dyn Storage) -> Result<(), SieveError> {
    println!("=== Stored History ===\n");
    println!("  Runs recorded: {}", storage.count_runs()?);
    println!("  Profiles stored: {}", storage.count_profiles()?);

    match storage.get_latest_run()? {
        Some(run) => {
            println!("\n  Latest run: #{}", run.id);
            println!("    Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("    Finished: {}", finished);
            }
            println!("    Status: {}", run.status.to_db_string());
            println!("    Profiles emitted: {}", run.profiles_emitted);
            println!("    Requests failed: {}", run.requests_failed);
            println!("    Config hash: {}", run.config_hash);
        }
        None => println!("\n  No runs recorded yet."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ProfileRecord;
    use crate::storage::SqliteStorage;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_open_sinks_jsonl_only() {
        let dir = tempdir().unwrap();
        let output = OutputConfig {
            jsonl_path: dir.path().join("out.jsonl").display().to_string(),
            database_path: None,
        };

        let sinks = open_sinks(&output, "hash").unwrap();
        assert_eq!(sinks.len(), 1);
    }

    #[test]
    fn test_open_sinks_with_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("runs.db");
        let output = OutputConfig {
            jsonl_path: dir.path().join("out.jsonl").display().to_string(),
            database_path: Some(db_path.display().to_string()),
        };

        let sinks = open_sinks(&output, "hash").unwrap();
        assert_eq!(sinks.len(), 2);

        sinks
            .emit(&ProfileRecord {
                name: "Jane".to_string(),
                headline: String::new(),
                location: String::new(),
                current_position: String::new(),
                educations: vec![],
                skills: vec![],
                profile_url: "https://example.com/in/jane".to_string(),
                scraped_at: Utc::now(),
            })
            .unwrap();
        drop(sinks);

        let storage = SqliteStorage::new(&db_path).unwrap();
        assert_eq!(storage.count_runs().unwrap(), 1);
        assert_eq!(storage.count_profiles().unwrap(), 1);
        print_history(&storage).unwrap();
    }
}
