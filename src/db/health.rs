//! Database diagnostics used by `tinybrain doctor`.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::schema;
use crate::memory::types::SearchIndexCapability;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: String,
    pub sqlite_version: String,
    pub journal_mode: String,
    pub foreign_keys: bool,
    pub search_index: SearchIndexCapability,
    /// FTS rows disagree with `memory_entries` when this is false.
    pub search_index_in_sync: bool,
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub foreign_key_violations: u64,
}

pub fn check_database_health(conn: &Connection) -> rusqlite::Result<HealthReport> {
    let schema_version = schema::schema_version(conn)?.unwrap_or_else(|| "(unset)".into());
    let sqlite_version: String = conn.query_row("SELECT sqlite_version()", [], |r| r.get(0))?;
    let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
    let foreign_keys: bool = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
    let search_index = schema::probe_search_index(conn)?;

    let search_index_in_sync = match search_index {
        SearchIndexCapability::None => true,
        SearchIndexCapability::Indexed => conn
            .execute(
                "INSERT INTO memory_entries_fts(memory_entries_fts, rank) VALUES ('integrity-check', 1)",
                [],
            )
            .is_ok(),
    };

    let integrity: Vec<String> = conn
        .prepare("PRAGMA integrity_check")?
        .query_map([], |r| r.get(0))?
        .collect::<Result<_, _>>()?;
    let integrity_ok = integrity.len() == 1 && integrity[0] == "ok";

    let foreign_key_violations = conn
        .prepare("PRAGMA foreign_key_check")?
        .query_map([], |_| Ok(()))?
        .count() as u64;

    Ok(HealthReport {
        schema_version,
        sqlite_version,
        journal_mode,
        foreign_keys,
        search_index,
        search_index_in_sync,
        integrity_ok,
        integrity_details: integrity.join("; "),
        foreign_key_violations,
    })
}
