//! SQLite storage for per-file score history.
//!
//! One table, `hist(file, score, band, ts)`, keyed by `(file, ts)`.
//! Timestamps are stored as fixed-width RFC 3339 strings so that text
//! ordering matches chronological ordering.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use riskpulse_core::{Band, HistoryEntry, RiskError};
use rusqlite::{params, Connection, Transaction};

/// Number of most recent runs inspected by [`HistoryBatch::streak`].
pub const STREAK_DEPTH: usize = 2;

/// Handle to the history database.
///
/// Open once per run, then stage all writes through [`HistoryStore::begin`].
///
/// # Examples
///
/// ```
/// use riskpulse_history::store::HistoryStore;
///
/// let store = HistoryStore::in_memory().unwrap();
/// assert_eq!(store.count().unwrap(), 0);
/// ```
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open or create a history database at the given path.
    ///
    /// Creates parent directories and the table if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] if the database cannot be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use riskpulse_history::store::HistoryStore;
    ///
    /// let store = HistoryStore::open(Path::new(".github/risk_scoring.db")).unwrap();
    /// ```
    pub fn open(path: &Path) -> Result<Self, RiskError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RiskError::Database(format!("failed to create history directory: {e}"))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| RiskError::Database(format!("failed to open database: {e}")))?;

        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!(path = %path.display(), "opened history store");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] if schema creation fails.
    pub fn in_memory() -> Result<Self, RiskError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            RiskError::Database(format!("failed to create in-memory database: {e}"))
        })?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), RiskError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS hist (
                    file TEXT NOT NULL,
                    score INTEGER NOT NULL,
                    band TEXT NOT NULL,
                    ts TEXT NOT NULL,
                    PRIMARY KEY (file, ts)
                );
                ",
            )
            .map_err(|e| RiskError::Database(format!("failed to create schema: {e}")))
    }

    /// Start a write batch. Nothing is persisted until [`HistoryBatch::commit`].
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] if the transaction cannot be started.
    pub fn begin(&mut self) -> Result<HistoryBatch<'_>, RiskError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| RiskError::Database(format!("failed to begin transaction: {e}")))?;
        Ok(HistoryBatch { tx, written: 0 })
    }

    /// Most recent entries for `path`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] on query failure or corrupt rows.
    pub fn recent(&self, path: &str, limit: usize) -> Result<Vec<HistoryEntry>, RiskError> {
        recent_entries(&self.conn, path, limit)
    }

    /// Streak for `path` against committed history only.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] on query failure.
    pub fn streak(&self, path: &str, band: Band) -> Result<usize, RiskError> {
        streak_for(&self.conn, path, band)
    }

    /// Total number of rows.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] on query failure.
    pub fn count(&self) -> Result<usize, RiskError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM hist", [], |row| row.get(0))
            .map_err(|e| RiskError::Database(format!("failed to count history: {e}")))?;
        Ok(n as usize)
    }
}

/// A pending set of history writes.
///
/// Reads through the batch see its own uncommitted rows. Dropping the
/// batch without calling [`HistoryBatch::commit`] rolls everything back.
pub struct HistoryBatch<'conn> {
    tx: Transaction<'conn>,
    written: usize,
}

impl HistoryBatch<'_> {
    /// Insert `entry`, replacing any row with the same `(file, ts)` key.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] if the insert fails.
    pub fn record(&mut self, entry: &HistoryEntry) -> Result<(), RiskError> {
        self.tx
            .execute(
                "INSERT OR REPLACE INTO hist (file, score, band, ts) VALUES (?1, ?2, ?3, ?4)",
                params![
                    entry.path,
                    entry.score,
                    entry.band.as_str(),
                    encode_ts(entry.timestamp),
                ],
            )
            .map_err(|e| RiskError::Database(format!("failed to record history: {e}")))?;
        self.written += 1;
        Ok(())
    }

    /// How many of the two most recent entries for `path` are in `band`.
    ///
    /// Returns 0 when `path` has fewer than two entries.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] on query failure.
    pub fn streak(&self, path: &str, band: Band) -> Result<usize, RiskError> {
        streak_for(&self.tx, path, band)
    }

    /// Persist every staged write.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Database`] if the commit fails.
    pub fn commit(self) -> Result<usize, RiskError> {
        let written = self.written;
        self.tx
            .commit()
            .map_err(|e| RiskError::Database(format!("failed to commit history: {e}")))?;
        tracing::debug!(rows = written, "committed history batch");
        Ok(written)
    }
}

fn streak_for(conn: &Connection, path: &str, band: Band) -> Result<usize, RiskError> {
    let mut stmt = conn
        .prepare("SELECT band FROM hist WHERE file = ?1 ORDER BY ts DESC LIMIT ?2")
        .map_err(|e| RiskError::Database(format!("failed to prepare streak query: {e}")))?;
    let bands = stmt
        .query_map(params![path, STREAK_DEPTH as i64], |row| row.get::<_, String>(0))
        .map_err(|e| RiskError::Database(format!("failed to query streak: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RiskError::Database(format!("failed to read streak row: {e}")))?;

    if bands.len() < STREAK_DEPTH {
        return Ok(0);
    }
    Ok(bands.iter().filter(|b| b.as_str() == band.as_str()).count())
}

fn recent_entries(
    conn: &Connection,
    path: &str,
    limit: usize,
) -> Result<Vec<HistoryEntry>, RiskError> {
    let mut stmt = conn
        .prepare("SELECT file, score, band, ts FROM hist WHERE file = ?1 ORDER BY ts DESC LIMIT ?2")
        .map_err(|e| RiskError::Database(format!("failed to prepare history query: {e}")))?;
    let rows = stmt
        .query_map(params![path, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|e| RiskError::Database(format!("failed to query history: {e}")))?;

    let mut entries = Vec::new();
    for row in rows {
        let (file, score, band, ts) =
            row.map_err(|e| RiskError::Database(format!("failed to read history row: {e}")))?;
        let band = band
            .parse::<Band>()
            .map_err(|e| RiskError::Database(format!("corrupt band for {file}: {e}")))?;
        entries.push(HistoryEntry {
            path: file,
            score,
            band,
            timestamp: decode_ts(&ts)?,
        });
    }
    Ok(entries)
}

fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_ts(raw: &str) -> Result<DateTime<Utc>, RiskError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RiskError::Database(format!("corrupt timestamp '{raw}': {e}")))
}
