//! Context snapshots: a caller-supplied JSON blob plus a generated text summary
//! of the session's top findings. Snapshots are immutable once written.

use rusqlite::{params, Connection, Row};

use crate::db::{format_timestamp, now};
use crate::error::{or_not_found, Result};
use crate::memory::types::{ContextSnapshot, CreateSnapshotRequest};
use crate::memory::{json_column, sql_limit, sql_offset, ts_column};

pub const SUMMARY_HEADER: &str = "Recent High-Priority Findings:\n";
pub const EMPTY_SUMMARY: &str = "Recent High-Priority Findings:\nNo high-priority findings yet.";
pub const FAILED_SUMMARY: &str = "Failed to generate summary";
pub const DEFAULT_SUMMARY_LIMIT: usize = 10;

const EXCERPT_CHARS: usize = 100;

const SNAPSHOT_COLUMNS: &str =
    "id, session_id, name, description, context_data, memory_summary, created_at";

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<ContextSnapshot> {
    Ok(ContextSnapshot {
        id: row.get(0)?,
        session_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        context_data: json_column(row, 4)?,
        memory_summary: row.get(5)?,
        created_at: ts_column(row, 6)?,
    })
}

/// Store a snapshot with a freshly generated summary.
///
/// A summary failure is logged and replaced by [`FAILED_SUMMARY`]; it never
/// fails the snapshot itself.
pub fn create_snapshot(
    conn: &Connection,
    req: &CreateSnapshotRequest,
    summary_limit: usize,
) -> Result<ContextSnapshot> {
    let memory_summary = match generate_summary(conn, &req.session_id, summary_limit) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(session_id = %req.session_id, error = %e, "summary generation failed");
            FAILED_SUMMARY.to_string()
        }
    };

    let snapshot = ContextSnapshot {
        id: uuid::Uuid::now_v7().to_string(),
        session_id: req.session_id.clone(),
        name: req.name.clone(),
        description: req.description.clone(),
        context_data: req.context_data.clone(),
        memory_summary,
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO context_snapshots (id, session_id, name, description, context_data, \
         memory_summary, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            snapshot.id,
            snapshot.session_id,
            snapshot.name,
            snapshot.description,
            serde_json::to_string(&snapshot.context_data)?,
            snapshot.memory_summary,
            format_timestamp(&snapshot.created_at),
        ],
    )?;
    tracing::info!(id = %snapshot.id, session_id = %snapshot.session_id, "snapshot created");
    Ok(snapshot)
}

/// Summarize the session's top entries by priority, confidence, then recency.
pub fn generate_summary(conn: &Connection, session_id: &str, limit: usize) -> Result<String> {
    let mut stmt = conn.prepare(
        "SELECT title, content, category, priority, confidence FROM memory_entries \
         WHERE session_id = ?1 \
         ORDER BY priority DESC, confidence DESC, created_at DESC, rowid DESC \
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![session_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Ok(EMPTY_SUMMARY.to_string());
    }

    let mut summary = String::from(SUMMARY_HEADER);
    for (n, (title, content, category, priority, confidence)) in rows.iter().enumerate() {
        summary.push_str(&format!(
            "{}. [{category}] {title} (Priority: {priority}, Confidence: {confidence:.1})\n",
            n + 1
        ));
        summary.push_str(&format!("   {}\n", excerpt(content)));
    }
    Ok(summary)
}

/// First 100 characters, with `...` when the content was longer.
fn excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_CHARS {
        let head: String = content.chars().take(EXCERPT_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

pub fn get_snapshot(conn: &Connection, id: &str) -> Result<ContextSnapshot> {
    conn.query_row(
        &format!("SELECT {SNAPSHOT_COLUMNS} FROM context_snapshots WHERE id = ?1"),
        params![id],
        snapshot_from_row,
    )
    .map_err(|e| or_not_found(e, "snapshot", id))
}

/// A session's snapshots, newest first.
pub fn list_snapshots(
    conn: &Connection,
    session_id: &str,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<Vec<ContextSnapshot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM context_snapshots WHERE session_id = ?1 \
         ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let snapshots = stmt
        .query_map(
            params![session_id, sql_limit(limit), sql_offset(offset)],
            snapshot_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(snapshots)
}
