//! Database and memory statistics.

use chrono::Duration;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::{format_timestamp, now};
use crate::error::Result;

/// Row counts per table plus on-disk size and the most-read entries.
#[derive(Debug, Serialize)]
pub struct DatabaseStats {
    pub sessions: u64,
    pub memory_entries: u64,
    pub relationships: u64,
    pub context_snapshots: u64,
    pub search_history: u64,
    pub task_progress: u64,
    /// `page_count * page_size`.
    pub db_size_bytes: u64,
    pub top_accessed: Vec<AccessedEntry>,
}

#[derive(Debug, Serialize)]
pub struct AccessedEntry {
    pub id: String,
    pub title: String,
    pub access_count: u32,
}

/// Priority, age, and usage breakdown of memory entries.
#[derive(Debug, Serialize)]
pub struct MemoryStats {
    pub total_entries: u64,
    /// Priority >= 8.
    pub high_priority: u64,
    /// Priority 5 to 7.
    pub medium_priority: u64,
    /// Priority < 5.
    pub low_priority: u64,
    pub created_last_7_days: u64,
    pub created_last_30_days: u64,
    pub created_last_90_days: u64,
    /// Last accessed more than 30 days ago and read fewer than 5 times.
    pub unused: u64,
    pub average_access_count: f64,
}

const TABLES: [&str; 6] = [
    "sessions",
    "memory_entries",
    "relationships",
    "context_snapshots",
    "search_history",
    "task_progress",
];

pub fn database_stats(conn: &Connection) -> Result<DatabaseStats> {
    let mut counts = [0u64; 6];
    for (slot, table) in counts.iter_mut().zip(TABLES) {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        *slot = n as u64;
    }

    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT id, title, access_count FROM memory_entries \
         ORDER BY access_count DESC, accessed_at DESC LIMIT 5",
    )?;
    let top_accessed = stmt
        .query_map([], |row| {
            Ok(AccessedEntry {
                id: row.get(0)?,
                title: row.get(1)?,
                access_count: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let [sessions, memory_entries, relationships, context_snapshots, search_history, task_progress] =
        counts;
    Ok(DatabaseStats {
        sessions,
        memory_entries,
        relationships,
        context_snapshots,
        search_history,
        task_progress,
        db_size_bytes: (page_count * page_size).max(0) as u64,
        top_accessed,
    })
}

pub fn memory_stats(conn: &Connection) -> Result<MemoryStats> {
    let now = now();
    let cutoff = |days: i64| format_timestamp(&(now - Duration::days(days)));

    let row = conn.query_row(
        "SELECT COUNT(*), \
             COALESCE(SUM(priority >= 8), 0), \
             COALESCE(SUM(priority BETWEEN 5 AND 7), 0), \
             COALESCE(SUM(priority < 5), 0), \
             COALESCE(SUM(created_at >= ?1), 0), \
             COALESCE(SUM(created_at >= ?2), 0), \
             COALESCE(SUM(created_at >= ?3), 0), \
             COALESCE(SUM(accessed_at < ?2 AND access_count < 5), 0), \
             COALESCE(AVG(access_count), 0.0) \
         FROM memory_entries",
        params![cutoff(7), cutoff(30), cutoff(90)],
        |row| {
            Ok(MemoryStats {
                total_entries: row.get::<_, i64>(0)? as u64,
                high_priority: row.get::<_, i64>(1)? as u64,
                medium_priority: row.get::<_, i64>(2)? as u64,
                low_priority: row.get::<_, i64>(3)? as u64,
                created_last_7_days: row.get::<_, i64>(4)? as u64,
                created_last_30_days: row.get::<_, i64>(5)? as u64,
                created_last_90_days: row.get::<_, i64>(6)? as u64,
                unused: row.get::<_, i64>(7)? as u64,
                average_access_count: row.get(8)?,
            })
        },
    )?;
    Ok(row)
}
