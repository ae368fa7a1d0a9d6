pub mod health;
pub mod schema;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::config::StorageConfig;
use crate::error::StoreError;
use crate::memory::types::SearchIndexCapability;

/// Handle to the single embedded SQLite database.
///
/// One connection sits behind a mutex, so writes are serialized. The FTS
/// capability is probed once at open and never re-checked.
pub struct Database {
    conn: Mutex<Connection>,
    capability: SearchIndexCapability,
    path: Option<PathBuf>,
    span: tracing::Span,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("capability", &self.capability)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database file, apply pragmas, and initialize the schema.
    pub fn open(path: impl AsRef<Path>, storage: &StorageConfig) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_millis(storage.busy_timeout_ms))?;

        let db = Self::init(conn, storage.full_text_search, Some(path.to_path_buf()))?;
        tracing::info!(path = %path.display(), capability = ?db.capability, "database initialized");
        Ok(db)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(full_text_search: bool) -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::init(conn, full_text_search, None)
    }

    fn init(conn: Connection, full_text_search: bool, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn, full_text_search).context("failed to initialize schema")?;
        let capability =
            schema::probe_search_index(&conn).context("failed to probe search index")?;

        let label = path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".into());
        let span = tracing::info_span!("tinybrain_db", db = %label);

        Ok(Self {
            conn: Mutex::new(conn),
            capability,
            path,
            span,
        })
    }

    pub fn capability(&self) -> SearchIndexCapability {
        self.capability
    }

    /// File path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic inside a transaction already rolled it back on unwind.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the connection in autocommit mode.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let _enter = self.span.enter();
        let conn = self.lock();
        f(&conn)
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction rolls back and the
    /// original error is returned unchanged; on panic it rolls back during
    /// unwinding and the panic continues.
    pub fn run_in_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let _enter = self.span.enter();
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Transaction(format!("begin failed: {e}")))?;

        let value = match f(&tx) {
            Ok(value) => value,
            Err(err) => {
                if let Err(e) = tx.rollback() {
                    tracing::warn!(error = %e, "rollback failed");
                }
                return Err(err);
            }
        };

        tx.commit()
            .map_err(|e| StoreError::Transaction(format!("commit failed: {e}")))?;
        Ok(value)
    }
}

/// Fixed-width RFC 3339 text (microseconds, `Z`) so lexical order is chronological.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Current time truncated to the stored precision, so values read back compare equal.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse_timestamp(&format_timestamp(&now)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(db: &Database, sql: &str) -> i64 {
        db.with_conn(|c| Ok(c.query_row(sql, [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn in_memory_capability_follows_flag() {
        let indexed = Database::open_in_memory(true).unwrap();
        assert_eq!(indexed.capability(), SearchIndexCapability::Indexed);
        assert!(indexed.path().is_none());

        let plain = Database::open_in_memory(false).unwrap();
        assert_eq!(plain.capability(), SearchIndexCapability::None);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = Database::open_in_memory(true).unwrap();
        assert_eq!(count(&db, "PRAGMA foreign_keys"), 1);
    }

    #[test]
    fn file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.db");
        let db = Database::open(&path, &StorageConfig::default()).unwrap();
        assert!(path.exists());
        let mode: String = db
            .with_conn(|c| Ok(c.query_row("PRAGMA journal_mode", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn transaction_commits_on_ok() {
        let db = Database::open_in_memory(true).unwrap();
        db.run_in_transaction(|c| {
            c.execute("INSERT INTO schema_meta (key, value) VALUES ('k', 'v')", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&db, "SELECT COUNT(*) FROM schema_meta WHERE key = 'k'"), 1);
    }

    #[test]
    fn transaction_rolls_back_and_returns_original_error() {
        let db = Database::open_in_memory(true).unwrap();
        let err = db
            .run_in_transaction(|c| {
                c.execute("INSERT INTO schema_meta (key, value) VALUES ('k', 'v')", [])?;
                Err::<(), _>(StoreError::not_found("session", "nope"))
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM schema_meta WHERE key = 'k'"), 0);
    }

    #[test]
    fn transaction_rolls_back_on_panic() {
        let db = Database::open_in_memory(true).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = db.run_in_transaction(|c| {
                c.execute("INSERT INTO schema_meta (key, value) VALUES ('k', 'v')", [])?;
                panic!("boom");
                #[allow(unreachable_code)]
                Ok(())
            });
        }));
        assert!(result.is_err());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM schema_meta WHERE key = 'k'"), 0);
    }

    #[test]
    fn timestamps_are_fixed_width_and_ordered() {
        let a = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        let b = parse_timestamp("2024-01-01T00:00:00.5Z").unwrap();
        let (fa, fb) = (format_timestamp(&a), format_timestamp(&b));
        assert_eq!(fa, "2024-01-01T00:00:00.000000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert!(parse_timestamp(&format_timestamp(&now())).is_ok());
    }
}
