//! SQLite-backed practice log.
//!
//! Provides persistent storage for:
//! - Per-day, per-technique practice seconds
//! - Finalized session summaries
//! - Goal compliance and daily statistics
//!
//! A `DailyLog` is a cheap handle over one shared connection, so the same log
//! can be wired in as both the activity and the export collaborator.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CollaboratorError, CoreError};
use crate::session::{ActivityLog, SessionExport, SessionSummary};

/// One goal checked against a day's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub technique_id: String,
    pub goal_minutes: u32,
    pub logged_seconds: u64,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayStats {
    pub total_seconds: u64,
    pub sessions: u64,
    pub by_technique: BTreeMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct DailyLog {
    conn: Arc<Mutex<Connection>>,
}

impl DailyLog {
    /// Open the log at `~/.config/breathwork/breathwork.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        Self::open_at(&data_dir()?.join("breathwork.db"))
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Open an in-memory log.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, CoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CoreError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CollaboratorError> {
        self.conn
            .lock()
            .map_err(|_| CollaboratorError::Storage("daily log lock poisoned".into()))
    }

    /// Add one second of practice to `technique_id` on `day`.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn add_second(&self, day: NaiveDate, technique_id: &str) -> Result<(), CollaboratorError> {
        self.lock()?.execute(
            "INSERT INTO practice (day, technique_id, seconds) VALUES (?1, ?2, 1)
             ON CONFLICT(day, technique_id) DO UPDATE SET seconds = seconds + 1",
            params![day.to_string(), technique_id],
        )?;
        Ok(())
    }

    /// Store a finalized session. Returns its generated id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, summary: &SessionSummary) -> Result<String, CollaboratorError> {
        let id = Uuid::new_v4().to_string();
        let day = summary.ended_at.with_timezone(&Local).date_naive();
        self.lock()?.execute(
            "INSERT INTO sessions
                (id, day, technique_id, technique_name, preset_id, duration_secs, cycles, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                day.to_string(),
                summary.technique_id,
                summary.technique_name,
                summary.preset_id,
                summary.duration_secs,
                summary.cycles,
                summary.started_at.to_rfc3339(),
                summary.ended_at.to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    /// Practice seconds per technique on `day`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn seconds_on(&self, day: NaiveDate) -> Result<BTreeMap<String, u64>, CollaboratorError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT technique_id, seconds FROM practice WHERE day = ?1")?;
        let rows = stmt.query_map(params![day.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (technique_id, seconds) = row?;
            out.insert(technique_id, seconds);
        }
        Ok(out)
    }

    /// Check each goal (technique id to daily minutes) against `day`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn compliance(
        &self,
        day: NaiveDate,
        goals: &BTreeMap<String, u32>,
    ) -> Result<Vec<GoalProgress>, CollaboratorError> {
        let logged = self.seconds_on(day)?;
        Ok(goals
            .iter()
            .map(|(technique_id, &goal_minutes)| {
                let logged_seconds = logged.get(technique_id).copied().unwrap_or(0);
                GoalProgress {
                    technique_id: technique_id.clone(),
                    goal_minutes,
                    logged_seconds,
                    met: logged_seconds >= u64::from(goal_minutes) * 60,
                }
            })
            .collect())
    }

    /// # Errors
    /// Returns an error if a query fails.
    pub fn stats_on(&self, day: NaiveDate) -> Result<DayStats, CollaboratorError> {
        let by_technique = self.seconds_on(day)?;
        let sessions = self.lock()?.query_row(
            "SELECT COUNT(*) FROM sessions WHERE day = ?1",
            params![day.to_string()],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(DayStats {
            total_seconds: by_technique.values().sum(),
            sessions,
            by_technique,
        })
    }

    /// # Errors
    /// Returns an error if a query fails.
    pub fn stats_today(&self) -> Result<DayStats, CollaboratorError> {
        self.stats_on(today())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS practice (
            day          TEXT NOT NULL,
            technique_id TEXT NOT NULL,
            seconds      INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (day, technique_id)
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id             TEXT PRIMARY KEY,
            day            TEXT NOT NULL,
            technique_id   TEXT NOT NULL,
            technique_name TEXT NOT NULL DEFAULT '',
            preset_id      TEXT,
            duration_secs  INTEGER NOT NULL,
            cycles         INTEGER NOT NULL DEFAULT 0,
            started_at     TEXT NOT NULL,
            ended_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_day ON sessions(day);",
    )
}

impl ActivityLog for DailyLog {
    fn record_second(&mut self, technique_id: &str) -> Result<(), CollaboratorError> {
        self.add_second(today(), technique_id)
    }
}

impl SessionExport for DailyLog {
    fn finalize(&mut self, summary: &SessionSummary) -> Result<(), CollaboratorError> {
        self.record_session(summary)
            .map(|_| ())
            .map_err(|e| CollaboratorError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn seconds_accumulate_per_day_and_technique() {
        let log = DailyLog::open_memory().unwrap();
        for _ in 0..90 {
            log.add_second(day(1), "box").unwrap();
        }
        log.add_second(day(1), "4-7-8").unwrap();
        log.add_second(day(2), "box").unwrap();

        let seconds = log.seconds_on(day(1)).unwrap();
        assert_eq!(seconds.get("box"), Some(&90));
        assert_eq!(seconds.get("4-7-8"), Some(&1));
        assert_eq!(log.seconds_on(day(2)).unwrap().get("box"), Some(&1));
    }

    #[test]
    fn compliance_checks_goal_minutes() {
        let log = DailyLog::open_memory().unwrap();
        for _ in 0..120 {
            log.add_second(day(5), "coherent").unwrap();
        }
        let goals = BTreeMap::from([("coherent".to_string(), 2), ("box".to_string(), 5)]);
        let report = log.compliance(day(5), &goals).unwrap();

        assert_eq!(report.len(), 2);
        let box_goal = report.iter().find(|g| g.technique_id == "box").unwrap();
        assert!(!box_goal.met);
        assert_eq!(box_goal.logged_seconds, 0);
        let coherent = report.iter().find(|g| g.technique_id == "coherent").unwrap();
        assert!(coherent.met);
    }

    #[test]
    fn sessions_count_toward_today() {
        let mut log = DailyLog::open_memory().unwrap();
        let summary = SessionSummary::ending_now(chrono::Utc::now(), 300, "4-7-8", "4-7-8", Some("wind-down".into()), 16);
        log.finalize(&summary).unwrap();
        log.record_second("4-7-8").unwrap();

        let stats = log.stats_today().unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.total_seconds, 1);
    }

    #[test]
    fn clones_share_one_connection() {
        let log = DailyLog::open_memory().unwrap();
        let other = log.clone();
        other.add_second(day(9), "calm").unwrap();
        assert_eq!(log.seconds_on(day(9)).unwrap().get("calm"), Some(&1));
    }

    #[test]
    fn file_backed_log_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.db");
        DailyLog::open_at(&path).unwrap().add_second(day(3), "box").unwrap();
        let reopened = DailyLog::open_at(&path).unwrap();
        assert_eq!(reopened.seconds_on(day(3)).unwrap().get("box"), Some(&1));
    }
}
