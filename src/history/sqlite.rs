//! SQLite-backed observation history

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::{normalize_label, HistoryError};
use crate::classifier::TrainingSource;
use crate::types::Observation;

/// A stored observation with its row id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub label: String,
    pub observed_at: DateTime<Utc>,
}

/// Persistent history of activity observations
#[derive(Clone)]
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryStore {
    /// Open (or create) the history database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create history directory")?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open history database {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init_schema(&conn)?;

        info!("Opened history database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                observed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_observations_time ON observations(observed_at);
        "#)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an activity happening now.
    ///
    /// The label is stored case-folded and trimmed (see [`normalize_label`]),
    /// so "Run" and "run" train as one activity.
    pub fn record(&self, label: &str) -> Result<HistoryRecord> {
        self.record_at(label, Utc::now())
    }

    /// Record an activity at a given instant; labels are normalized as in
    /// [`record`](Self::record)
    pub fn record_at(&self, label: &str, observed_at: DateTime<Utc>) -> Result<HistoryRecord> {
        let label = normalize_label(label)?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO observations (label, observed_at) VALUES (?1, ?2)",
            params![label, observed_at.to_rfc3339_opts(SecondsFormat::Micros, true)],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Recorded observation {} '{}' at {}", id, label, observed_at);
        Ok(HistoryRecord { id, label, observed_at })
    }

    /// Every observation, oldest first (ties in insertion order)
    pub fn all(&self) -> Result<Vec<HistoryRecord>> {
        self.query(
            "SELECT id, label, observed_at FROM observations ORDER BY observed_at ASC, id ASC",
            None,
        )
    }

    /// The most recent observations, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        self.query(
            "SELECT id, label, observed_at FROM observations ORDER BY observed_at DESC, id DESC LIMIT ?1",
            Some(limit as i64),
        )
    }

    fn query(&self, sql: &str, limit: Option<i64>) -> Result<Vec<HistoryRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(sql)?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(i64, String, String)> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        };
        let rows = match limit {
            Some(limit) => stmt.query_map(params![limit], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt.query_map([], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
        };

        rows.into_iter()
            .map(|(id, label, stamp)| -> Result<HistoryRecord> {
                let observed_at = DateTime::parse_from_rfc3339(&stamp)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|_| HistoryError::BadTimestamp { id, value: stamp.clone() })?;
                Ok(HistoryRecord { id, label, observed_at })
            })
            .collect()
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of observations per label, most frequent first
    pub fn label_counts(&self) -> Result<Vec<(String, usize)>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT label, COUNT(*) AS n FROM observations GROUP BY label ORDER BY n DESC, label ASC",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let label: String = row.get(0)?;
                let n: i64 = row.get(1)?;
                Ok((label, n as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }

    /// Delete every observation; returns how many were removed
    pub fn clear(&self) -> Result<usize> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM observations", [])?;
        info!("Cleared {} observations", deleted);
        Ok(deleted)
    }
}

impl TrainingSource<String> for HistoryStore {
    fn observations(&self) -> Result<Vec<Observation<String>>> {
        Ok(self
            .all()?
            .into_iter()
            .map(|r| Observation::new(r.label, r.observed_at))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn utc(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_record_and_read_back_in_time_order() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.record_at("Read", utc(2, 21)).unwrap();
        store.record_at("run", utc(1, 7)).unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].label, "run");
        assert_eq!(all[1].label, "read");
        assert_eq!(all[1].observed_at, utc(2, 21));
    }

    #[test]
    fn test_recent_is_newest_first() {
        let store = HistoryStore::open_in_memory().unwrap();
        for day in 1..=5 {
            store.record_at("run", utc(day, 7)).unwrap();
        }
        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].observed_at, utc(5, 7));
        assert_eq!(recent[1].observed_at, utc(4, 7));
    }

    #[test]
    fn test_empty_label_rejected() {
        let store = HistoryStore::open_in_memory().unwrap();
        let err = store.record_at("  ", utc(1, 1)).unwrap_err();
        assert!(matches!(err.downcast_ref::<HistoryError>(), Some(HistoryError::EmptyLabel)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_label_counts_and_clear() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.record_at("run", utc(1, 7)).unwrap();
        store.record_at("read", utc(1, 21)).unwrap();
        store.record_at("run", utc(2, 7)).unwrap();

        assert_eq!(
            store.label_counts().unwrap(),
            vec![("run".to_string(), 2), ("read".to_string(), 1)]
        );
        assert_eq!(store.clear().unwrap(), 3);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_labels_differing_by_case_are_one_activity() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.record_at("Run", utc(1, 7)).unwrap();
        store.record_at(" run", utc(2, 7)).unwrap();
        store.record_at("RUN ", utc(3, 7)).unwrap();

        assert_eq!(store.label_counts().unwrap(), vec![("run".to_string(), 3)]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        {
            let store = HistoryStore::open(&path).unwrap();
            store.record_at("run", utc(1, 7)).unwrap();
        }
        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_corrupt_timestamp_reported() {
        let store = HistoryStore::open_in_memory().unwrap();
        store
            .lock()
            .execute("INSERT INTO observations (label, observed_at) VALUES ('run', 'yesterday')", [])
            .unwrap();

        let err = store.all().unwrap_err();
        match err.downcast_ref::<HistoryError>() {
            Some(HistoryError::BadTimestamp { value, .. }) => assert_eq!(value, "yesterday"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_training_source_yields_observations() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.record_at("run", utc(1, 7)).unwrap();
        let observations = store.observations().unwrap();
        assert_eq!(observations, vec![Observation::new("run".to_string(), utc(1, 7))]);
    }
}
