//! JSON Lines output sink
//!
//! Appends one JSON object per profile to a file. Each line is flushed as
//! soon as it is written so an interrupted run keeps everything it emitted.

use crate::output::stats::RunOutcome;
use crate::output::traits::{OutputError, OutputResult, ProfileSink};
use crate::record::ProfileRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Sink writing newline-delimited JSON
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Opens (or creates) the output file in append mode
    pub fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl ProfileSink for JsonLinesSink {
    fn emit(&self, record: &ProfileRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock writer: {}", e)))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(())
    }

    fn finalize(&self, outcome: &RunOutcome) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock writer: {}", e)))?;
        writer.flush()?;

        tracing::info!(
            "Wrote {} profiles to {}",
            outcome.stats.profiles_emitted,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::stats::RunStatsSnapshot;
    use crate::record::EducationEntry;
    use chrono::Utc;
    use tempfile::tempdir;

    fn record(url: &str) -> ProfileRecord {
        ProfileRecord {
            name: "Jane Doe".to_string(),
            headline: "Engineer".to_string(),
            location: "Lyon".to_string(),
            current_position: String::new(),
            educations: vec![EducationEntry {
                school: "INSA Lyon, France".to_string(),
                degree: "MEng".to_string(),
                period: "2012 – 2017".to_string(),
            }],
            skills: vec!["Rust".to_string()],
            profile_url: url.to_string(),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/profiles.jsonl");

        let sink = JsonLinesSink::open(&path).unwrap();
        sink.emit(&record("https://example.com/in/a")).unwrap();
        sink.emit(&record("https://example.com/in/b")).unwrap();
        sink.finalize(&RunOutcome::new(RunStatsSnapshot::default(), false))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: ProfileRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.profile_url, "https://example.com/in/b");
        assert_eq!(parsed.educations[0].school, "INSA Lyon, France");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.jsonl");

        JsonLinesSink::open(&path)
            .unwrap()
            .emit(&record("https://example.com/in/a"))
            .unwrap();
        JsonLinesSink::open(&path)
            .unwrap()
            .emit(&record("https://example.com/in/b"))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
