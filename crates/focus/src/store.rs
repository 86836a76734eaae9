//! Focus storage
//!
//! Handles persisting the settings record and the session logs.
//! - Settings: ~/.local/share/focusplay/focus/settings.json
//! - Session logs: ~/.local/share/focusplay/focus/sessions-YYYY-MM-DD.jsonl

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::session::SessionRecord;
use crate::settings::Settings;

/// Focus data store
#[derive(Debug, Clone)]
pub struct FocusStore {
    /// Base directory for focus data
    data_dir: PathBuf,
}

impl FocusStore {
    /// Create a new focus store with the given data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).with_context(|| {
            format!("Failed to create focus data directory: {}", data_dir.display())
        })?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    fn session_log_path(&self, date: &NaiveDate) -> PathBuf {
        self.data_dir.join(format!("sessions-{}.jsonl", date))
    }

    /// Load settings, merged over defaults. A missing or empty file yields
    /// the defaults.
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let path = self.settings_path();
        let content = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    /// Append a finished stint to the log of the day it started
    pub fn record_session(&self, record: &SessionRecord) -> Result<()> {
        let date = record.start_time().date_naive();
        let path = self.session_log_path(&date);

        let line = serde_json::to_string(record).context("Failed to serialize session record")?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open session log: {}", path.display()))?;

        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write to session log: {}", path.display()))
    }

    /// Get all records for a specific date
    pub fn get_sessions_for_date(&self, date: &NaiveDate) -> Result<Vec<SessionRecord>> {
        let path = self.session_log_path(date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)
            .with_context(|| format!("Failed to open session log: {}", path.display()))?;

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line
                .with_context(|| format!("Failed to read line {} of session log", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<SessionRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = line_num + 1,
                        "skipping malformed session record: {}",
                        e
                    );
                }
            }
        }

        Ok(records)
    }

    /// Get all records for the last N days, oldest first
    pub fn get_sessions_for_days(&self, days: u32) -> Result<Vec<SessionRecord>> {
        let today = Utc::now().date_naive();
        let mut all = Vec::new();

        for i in 0..days {
            let date = today - chrono::Duration::days(i as i64);
            all.extend(self.get_sessions_for_date(&date)?);
        }

        all.sort_by_key(|r| r.start);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use tempfile::TempDir;

    fn temp_store() -> (FocusStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FocusStore::new(&dir.path().join("focus")).unwrap();
        (store, dir)
    }

    fn record(kind: SessionKind, minutes: f64) -> SessionRecord {
        let end = Utc::now().timestamp();
        SessionRecord {
            kind,
            start: end - (minutes * 60.0) as i64,
            end,
            minutes,
            long_break: false,
        }
    }

    #[test]
    fn test_missing_settings_are_defaults() {
        let (store, _dir) = temp_store();
        assert_eq!(store.load_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load_settings() {
        let (store, _dir) = temp_store();

        let settings = Settings {
            sound_enabled: false,
            focus_time: 33.3,
            ..Default::default()
        };
        store.save_settings(&settings).unwrap();

        assert_eq!(store.load_settings().unwrap(), settings);
    }

    #[test]
    fn test_malformed_settings_is_error() {
        let (store, _dir) = temp_store();
        fs::write(store.settings_path(), "[1, 2").unwrap();
        assert!(store.load_settings().is_err());
    }

    #[test]
    fn test_record_and_retrieve_sessions() {
        let (store, _dir) = temp_store();

        store.record_session(&record(SessionKind::Focus, 25.0)).unwrap();
        store.record_session(&record(SessionKind::Rest, 5.0)).unwrap();

        let records = store.get_sessions_for_days(1).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.kind == SessionKind::Rest));
    }

    #[test]
    fn test_malformed_log_line_is_skipped() {
        let (store, _dir) = temp_store();
        let rec = record(SessionKind::Focus, 10.0);
        store.record_session(&rec).unwrap();

        let path = store.session_log_path(&rec.start_time().date_naive());
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();

        let records = store
            .get_sessions_for_date(&rec.start_time().date_naive())
            .unwrap();
        assert_eq!(records, vec![rec]);
    }
}
