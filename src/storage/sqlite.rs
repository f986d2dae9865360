//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::output::RunOutcome;
use crate::record::{EducationEntry, ProfileRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PROFILE_COLUMNS: &str = "name, headline, location, current_position, educations_json, \
                               skills_json, profile_url, scraped_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<(RunRecord, String)> {
        let status: String = row.get(4)?;
        let run = RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::Running,
            profiles_emitted: row.get::<_, i64>(5)? as u64,
            requests_failed: row.get::<_, i64>(6)? as u64,
        };
        Ok((run, status))
    }

    fn finish_run_row((mut run, status): (RunRecord, String)) -> StorageResult<RunRecord> {
        run.status = RunStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Database(format!("Unknown run status: {}", status)))?;
        Ok(run)
    }
}

/// Raw profile columns before JSON and timestamp decoding
struct ProfileRow {
    name: String,
    headline: String,
    location: String,
    current_position: String,
    educations_json: String,
    skills_json: String,
    profile_url: String,
    scraped_at: String,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            headline: row.get(1)?,
            location: row.get(2)?,
            current_position: row.get(3)?,
            educations_json: row.get(4)?,
            skills_json: row.get(5)?,
            profile_url: row.get(6)?,
            scraped_at: row.get(7)?,
        })
    }

    fn into_record(self) -> StorageResult<ProfileRecord> {
        let educations: Vec<EducationEntry> = serde_json::from_str(&self.educations_json)?;
        let skills: Vec<String> = serde_json::from_str(&self.skills_json)?;
        let scraped_at = DateTime::parse_from_rfc3339(&self.scraped_at)
            .map_err(|e| StorageError::Database(format!("Bad scraped_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(ProfileRecord {
            name: self.name,
            headline: self.headline,
            location: self.location,
            current_position: self.current_position,
            educations,
            skills,
            profile_url: self.profile_url,
            scraped_at,
        })
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let row = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, profiles_emitted, \
                 requests_failed FROM runs WHERE id = ?1",
                params![run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;

        Self::finish_run_row(row)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, profiles_emitted, \
                 requests_failed FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::run_from_row,
            )
            .optional()?
            .map(Self::finish_run_row)
            .transpose()
    }

    fn complete_run(&mut self, run_id: i64, outcome: &RunOutcome) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2, profiles_emitted = ?3, \
             requests_failed = ?4 WHERE id = ?5",
            params![
                now,
                outcome.status().to_db_string(),
                outcome.stats.profiles_emitted as i64,
                outcome.stats.requests_failed_permanently as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Profiles =====

    fn save_profile(&mut self, run_id: i64, record: &ProfileRecord) -> StorageResult<()> {
        let educations_json = serde_json::to_string(&record.educations)?;
        let skills_json = serde_json::to_string(&record.skills)?;

        self.conn.execute(
            "INSERT INTO profiles (name, headline, location, current_position, educations_json,
                                   skills_json, profile_url, scraped_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(profile_url) DO UPDATE SET
                name = excluded.name,
                headline = excluded.headline,
                location = excluded.location,
                current_position = excluded.current_position,
                educations_json = excluded.educations_json,
                skills_json = excluded.skills_json,
                scraped_at = excluded.scraped_at,
                run_id = excluded.run_id",
            params![
                record.name,
                record.headline,
                record.location,
                record.current_position,
                educations_json,
                skills_json,
                record.profile_url,
                record.scraped_at.to_rfc3339(),
                run_id
            ],
        )?;
        Ok(())
    }

    fn get_profile(&self, profile_url: &str) -> StorageResult<Option<ProfileRecord>> {
        let sql = format!("SELECT {} FROM profiles WHERE profile_url = ?1", PROFILE_COLUMNS);
        self.conn
            .query_row(&sql, params![profile_url], ProfileRow::from_row)
            .optional()?
            .map(ProfileRow::into_record)
            .transpose()
    }

    fn load_profiles(&self, run_id: i64) -> StorageResult<Vec<ProfileRecord>> {
        let sql = format!(
            "SELECT {} FROM profiles WHERE run_id = ?1 ORDER BY id",
            PROFILE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![run_id], ProfileRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(ProfileRow::into_record).collect()
    }

    fn count_profiles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
