//! Session export and import.
//!
//! An export is a self-contained JSON document. Importing it always creates a
//! fresh session with new ids for every entry and task; relationships are
//! remapped onto the new entry ids and dropped when either endpoint was not
//! part of the export. Snapshots are exported for reference but not imported,
//! since their summaries describe the original session.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::now;
use crate::error::Result;
use crate::memory::relations::{insert_relationship, list_relationships};
use crate::memory::sessions::{get_session, insert_session};
use crate::memory::snapshots::list_snapshots;
use crate::memory::store::{entry_from_row, insert_entry, ENTRY_COLUMNS};
use crate::memory::tasks::{insert_task, list_tasks};
use crate::memory::types::{
    ContextSnapshot, MemoryEntry, Relationship, Session, SessionStatus, TaskProgress,
};

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub session: Session,
    pub memory_entries: Vec<MemoryEntry>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub snapshots: Vec<ContextSnapshot>,
    #[serde(default)]
    pub tasks: Vec<TaskProgress>,
}

impl SessionExport {
    /// Number of rows an import will attempt to write.
    pub fn item_count(&self) -> usize {
        self.memory_entries.len() + self.relationships.len() + self.tasks.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub session_id: String,
    pub entries: usize,
    pub relationships: usize,
    pub relationships_skipped: usize,
    pub tasks: usize,
}

/// Collect a session and everything it owns. Not an access.
pub fn export_session(conn: &Connection, session_id: &str) -> Result<SessionExport> {
    let session = get_session(conn, session_id)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_entries me WHERE me.session_id = ?1 \
         ORDER BY me.created_at ASC, me.rowid ASC"
    ))?;
    let memory_entries = stmt
        .query_map(params![session_id], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut seen = std::collections::HashSet::new();
    let mut relationships = Vec::new();
    for entry in &memory_entries {
        for rel in list_relationships(conn, &entry.id)? {
            if seen.insert(rel.id.clone()) {
                relationships.push(rel);
            }
        }
    }

    let snapshots = list_snapshots(conn, session_id, None, None)?;
    let tasks = list_tasks(conn, session_id, None, None, None)?;

    tracing::info!(
        session_id = %session_id,
        entries = memory_entries.len(),
        relationships = relationships.len(),
        "session exported"
    );
    Ok(SessionExport {
        version: EXPORT_VERSION,
        exported_at: now(),
        session,
        memory_entries,
        relationships,
        snapshots,
        tasks,
    })
}

/// Recreate an exported session under new ids. Callers run this inside a
/// transaction. `on_item` fires after each entry, relationship, and task.
pub fn import_session(
    conn: &Connection,
    export: &SessionExport,
    mut on_item: impl FnMut(),
) -> Result<ImportSummary> {
    let ts = now();
    let session = Session {
        id: uuid::Uuid::now_v7().to_string(),
        status: SessionStatus::Active,
        created_at: ts,
        updated_at: ts,
        ..export.session.clone()
    };
    insert_session(conn, &session)?;

    let mut id_map: HashMap<&str, String> = HashMap::new();
    for entry in &export.memory_entries {
        let new_id = uuid::Uuid::now_v7().to_string();
        let copy = MemoryEntry {
            id: new_id.clone(),
            session_id: session.id.clone(),
            ..entry.clone()
        };
        insert_entry(conn, &copy)?;
        id_map.insert(entry.id.as_str(), new_id);
        on_item();
    }

    let mut relationships = 0;
    let mut relationships_skipped = 0;
    for rel in &export.relationships {
        match (
            id_map.get(rel.source_entry_id.as_str()),
            id_map.get(rel.target_entry_id.as_str()),
        ) {
            (Some(source), Some(target)) => {
                let copy = Relationship {
                    id: uuid::Uuid::now_v7().to_string(),
                    source_entry_id: source.clone(),
                    target_entry_id: target.clone(),
                    ..rel.clone()
                };
                insert_relationship(conn, &copy)?;
                relationships += 1;
            }
            _ => relationships_skipped += 1,
        }
        on_item();
    }

    for task in &export.tasks {
        let copy = TaskProgress {
            id: uuid::Uuid::now_v7().to_string(),
            session_id: session.id.clone(),
            ..task.clone()
        };
        insert_task(conn, &copy)?;
        on_item();
    }

    let summary = ImportSummary {
        session_id: session.id,
        entries: id_map.len(),
        relationships,
        relationships_skipped,
        tasks: export.tasks.len(),
    };
    tracing::info!(
        session_id = %summary.session_id,
        entries = summary.entries,
        relationships = summary.relationships,
        skipped = summary.relationships_skipped,
        "session imported"
    );
    Ok(summary)
}
