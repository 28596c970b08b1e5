use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("seen-store {path} I/O failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seen-store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Listing ids already visited, with the time each was first seen.
///
/// Backed by a SQLite table `seen_vacancies(id, first_seen_at)`. Every insert
/// is its own transaction, so an interrupted run leaves the store readable.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    conn: Connection,
}

// Fixed-width UTC timestamps compare correctly as text
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl SeenStore {
    /// Opens the database, creating the file and its table when missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS seen_vacancies (
                id TEXT PRIMARY KEY,
                first_seen_at TEXT NOT NULL
            )",
            [],
        )?;

        let store = Self { path, conn };
        ::log::debug!("Seen-store {} holds {} ids", store.path.display(), store.len());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.conn
            .query_row("SELECT COUNT(*) FROM seen_vacancies", [], |row| row.get::<_, i64>(0))
            .map(|n| usize::try_from(n).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookup errors read as "not seen"
    pub fn is_seen(&self, id: &str) -> bool {
        match self
            .conn
            .query_row("SELECT 1 FROM seen_vacancies WHERE id = ?1", params![id], |_| Ok(()))
            .optional()
        {
            Ok(found) => found.is_some(),
            Err(e) => {
                ::log::debug!("is_seen({}) failed: {}", id, e);
                false
            }
        }
    }

    pub fn first_seen(&self, id: &str) -> Option<DateTime<Utc>> {
        let raw: String = self
            .conn
            .query_row(
                "SELECT first_seen_at FROM seen_vacancies WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Records `id` unless it is already known. Failures are ignored.
    pub fn mark_seen(&self, id: &str) {
        if let Err(e) = self.mark_seen_at(id, Utc::now()) {
            ::log::debug!("mark_seen failed, ignoring: {}", e);
        }
    }

    fn mark_seen_at(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO seen_vacancies (id, first_seen_at) VALUES (?1, ?2)",
            params![id, timestamp(at)],
        )?;
        Ok(())
    }

    /// Forgets ids first seen more than `ttl_days` ago. `0` keeps everything.
    pub fn cleanup(&self, ttl_days: u32) -> Result<usize, StoreError> {
        self.cleanup_at(ttl_days, Utc::now())
    }

    fn cleanup_at(&self, ttl_days: u32, now: DateTime<Utc>) -> Result<usize, StoreError> {
        if ttl_days == 0 {
            return Ok(0);
        }
        let cutoff = now - Duration::days(i64::from(ttl_days));
        let removed = self.conn.execute(
            "DELETE FROM seen_vacancies WHERE first_seen_at < ?1",
            params![timestamp(cutoff)],
        )?;
        if removed > 0 {
            ::log::info!("Forgot {} listings seen more than {} days ago", removed, ttl_days);
        }
        Ok(removed)
    }
}
