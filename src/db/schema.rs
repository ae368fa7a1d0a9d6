//! SQL DDL for all tinybrain tables.
//!
//! Defines `sessions`, `memory_entries`, `relationships`, `context_snapshots`,
//! `search_history`, `task_progress`, and `schema_meta`, the two read views, and
//! the optional `memory_entries_fts` (FTS5) index with its sync triggers. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

use crate::memory::types::SearchIndexCapability;

pub const SCHEMA_VERSION: &str = "1";

/// Core tables, indexes, and views.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    task_type TEXT NOT NULL CHECK(task_type IN ('security_review','penetration_test','exploit_dev','vulnerability_analysis','threat_modeling','incident_response','general')),
    status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','paused','completed','archived')),
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_task_type ON sessions(task_type);
CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);
CREATE INDEX IF NOT EXISTS idx_sessions_created ON sessions(created_at);

CREATE TABLE IF NOT EXISTS memory_entries (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    content_type TEXT NOT NULL DEFAULT 'text' CHECK(content_type IN ('text','code','json','yaml','markdown','binary_ref')),
    category TEXT NOT NULL CHECK(category IN ('finding','vulnerability','exploit','payload','technique','tool','reference','context','hypothesis','evidence','recommendation','note')),
    priority INTEGER NOT NULL DEFAULT 5 CHECK(priority >= 0 AND priority <= 10),
    confidence REAL NOT NULL DEFAULT 0.5 CHECK(confidence >= 0.0 AND confidence <= 1.0),
    tags TEXT NOT NULL DEFAULT '[]',
    source TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    accessed_at TEXT NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 0 CHECK(access_count >= 0)
);

CREATE INDEX IF NOT EXISTS idx_entries_session ON memory_entries(session_id);
CREATE INDEX IF NOT EXISTS idx_entries_category ON memory_entries(category);
CREATE INDEX IF NOT EXISTS idx_entries_priority ON memory_entries(priority);
CREATE INDEX IF NOT EXISTS idx_entries_confidence ON memory_entries(confidence);
CREATE INDEX IF NOT EXISTS idx_entries_created ON memory_entries(created_at);
CREATE INDEX IF NOT EXISTS idx_entries_accessed ON memory_entries(accessed_at);

CREATE TABLE IF NOT EXISTS relationships (
    id TEXT PRIMARY KEY,
    source_entry_id TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
    target_entry_id TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
    relationship_type TEXT NOT NULL CHECK(relationship_type IN ('depends_on','causes','mitigates','exploits','references','contradicts','supports','related_to','parent_of','child_of')),
    strength REAL NOT NULL DEFAULT 0.5 CHECK(strength >= 0.0 AND strength <= 1.0),
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(source_entry_id, target_entry_id, relationship_type)
);

CREATE INDEX IF NOT EXISTS idx_relationships_source ON relationships(source_entry_id);
CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_entry_id);
CREATE INDEX IF NOT EXISTS idx_relationships_type ON relationships(relationship_type);

CREATE TABLE IF NOT EXISTS context_snapshots (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    context_data TEXT NOT NULL DEFAULT '{}',
    memory_summary TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snapshots_session ON context_snapshots(session_id);

CREATE TABLE IF NOT EXISTS search_history (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    query TEXT NOT NULL,
    search_type TEXT NOT NULL
        CHECK(search_type IN ('semantic','exact','fuzzy','tag','category','relationship')),
    results_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_search_history_session ON search_history(session_id);

CREATE TABLE IF NOT EXISTS task_progress (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    task_name TEXT NOT NULL,
    stage TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending','in_progress','completed','failed','blocked')),
    progress_percentage INTEGER NOT NULL DEFAULT 0 CHECK(progress_percentage >= 0 AND progress_percentage <= 100),
    notes TEXT NOT NULL DEFAULT '',
    started_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_session ON task_progress(session_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON task_progress(status);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE VIEW IF NOT EXISTS memory_entries_with_session AS
SELECT me.*,
       s.name AS session_name,
       s.task_type AS session_task_type,
       s.status AS session_status
FROM memory_entries me
JOIN sessions s ON s.id = me.session_id;

CREATE VIEW IF NOT EXISTS relationship_network AS
SELECT r.id,
       r.source_entry_id,
       r.target_entry_id,
       r.relationship_type,
       r.strength,
       r.description,
       r.created_at,
       src.session_id AS session_id,
       src.title AS source_title,
       src.category AS source_category,
       tgt.title AS target_title,
       tgt.category AS target_category
FROM relationships r
JOIN memory_entries src ON src.id = r.source_entry_id
JOIN memory_entries tgt ON tgt.id = r.target_entry_id;
"#;

/// External-content FTS5 index over entry text. Triggers keep it in sync; the
/// update trigger only fires when an indexed column changes, so access tracking
/// never touches the index.
const FTS_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS memory_entries_fts USING fts5(
    title,
    content,
    tags,
    content='memory_entries',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS memory_entries_fts_insert AFTER INSERT ON memory_entries BEGIN
    INSERT INTO memory_entries_fts(rowid, title, content, tags)
    VALUES (new.rowid, new.title, new.content, new.tags);
END;

CREATE TRIGGER IF NOT EXISTS memory_entries_fts_delete AFTER DELETE ON memory_entries BEGIN
    INSERT INTO memory_entries_fts(memory_entries_fts, rowid, title, content, tags)
    VALUES ('delete', old.rowid, old.title, old.content, old.tags);
END;

CREATE TRIGGER IF NOT EXISTS memory_entries_fts_update AFTER UPDATE OF title, content, tags ON memory_entries BEGIN
    INSERT INTO memory_entries_fts(memory_entries_fts, rowid, title, content, tags)
    VALUES ('delete', old.rowid, old.title, old.content, old.tags);
    INSERT INTO memory_entries_fts(rowid, title, content, tags)
    VALUES (new.rowid, new.title, new.content, new.tags);
END;
"#;

/// Initialize all schema objects. Idempotent.
///
/// When `full_text_search` is set the FTS5 index is created too. A failure to
/// create it (e.g. SQLite built without FTS5) is logged and leaves the store
/// on substring search.
pub fn init_schema(conn: &Connection, full_text_search: bool) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    if full_text_search {
        let existed = probe_search_index(conn)? == SearchIndexCapability::Indexed;
        match conn.execute_batch(FTS_SQL) {
            // Index added to a database that already holds entries.
            Ok(()) if !existed => conn.execute(
                "INSERT INTO memory_entries_fts(memory_entries_fts) VALUES ('rebuild')",
                [],
            )
            .map(|_| ())?,
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(error = %e, "full-text index unavailable, falling back to substring search");
            }
        }
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Check `sqlite_master` for the FTS table.
pub fn probe_search_index(conn: &Connection) -> rusqlite::Result<SearchIndexCapability> {
    let present: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'memory_entries_fts'",
        [],
        |row| row.get(0),
    )?;
    Ok(if present {
        SearchIndexCapability::Indexed
    } else {
        SearchIndexCapability::None
    })
}

/// Read the stored schema version, if any.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<Option<String>> {
    use rusqlite::OptionalExtension;
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| row.get(0),
    )
    .optional()
}
