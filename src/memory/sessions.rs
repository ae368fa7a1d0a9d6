//! Session lifecycle: create, read, patch, delete, and filtered listing.
//!
//! Deleting a session cascades through foreign keys to its entries (and their
//! relationships), snapshots, search history, and task progress.

use rusqlite::{params, Connection, Row};

use crate::db::{format_timestamp, now};
use crate::error::{or_not_found, Result, StoreError};
use crate::memory::types::{
    empty_object, CreateSessionRequest, Session, SessionFilter, SessionStatus,
    UpdateSessionRequest,
};
use crate::memory::{json_column, sql_limit, sql_offset, ts_column};

const SESSION_COLUMNS: &str =
    "id, name, description, task_type, status, metadata, created_at, updated_at";

pub(crate) fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        task_type: row.get(3)?,
        status: row.get(4)?,
        metadata: json_column(row, 5)?,
        created_at: ts_column(row, 6)?,
        updated_at: ts_column(row, 7)?,
    })
}

/// Create a new active session.
pub fn create_session(conn: &Connection, req: &CreateSessionRequest) -> Result<Session> {
    let ts = now();
    let session = Session {
        id: uuid::Uuid::now_v7().to_string(),
        name: req.name.clone(),
        description: req.description.clone(),
        task_type: req.task_type,
        status: SessionStatus::Active,
        metadata: req.metadata.clone().unwrap_or_else(empty_object),
        created_at: ts,
        updated_at: ts,
    };
    insert_session(conn, &session)?;
    tracing::info!(id = %session.id, task_type = %session.task_type, "session created");
    Ok(session)
}

/// Insert a fully-formed session row.
pub(crate) fn insert_session(conn: &Connection, session: &Session) -> Result<()> {
    let metadata = serde_json::to_string(&session.metadata)?;
    let ts = format_timestamp(&session.created_at);
    conn.execute(
        "INSERT INTO sessions (id, name, description, task_type, status, metadata, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            session.id,
            session.name,
            session.description,
            session.task_type,
            session.status,
            metadata,
            ts,
            format_timestamp(&session.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_session(conn: &Connection, id: &str) -> Result<Session> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
        params![id],
        session_from_row,
    )
    .map_err(|e| or_not_found(e, "session", id))
}

/// List sessions, newest first, optionally filtered by task type and status.
pub fn list_sessions(conn: &Connection, filter: &SessionFilter) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions \
         WHERE (?1 IS NULL OR task_type = ?1) AND (?2 IS NULL OR status = ?2) \
         ORDER BY created_at DESC, rowid DESC LIMIT ?3 OFFSET ?4"
    ))?;
    let sessions = stmt
        .query_map(
            params![
                filter.task_type,
                filter.status,
                sql_limit(filter.limit),
                sql_offset(filter.offset),
            ],
            session_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(sessions)
}

/// Apply a partial update; unset fields keep their stored values.
pub fn update_session(
    conn: &Connection,
    id: &str,
    patch: &UpdateSessionRequest,
) -> Result<Session> {
    let mut session = get_session(conn, id)?;

    if let Some(name) = &patch.name {
        session.name = name.clone();
    }
    if let Some(description) = &patch.description {
        session.description = description.clone();
    }
    if let Some(status) = patch.status {
        session.status = status;
    }
    if let Some(metadata) = &patch.metadata {
        session.metadata = metadata.clone();
    }
    session.updated_at = now();

    conn.execute(
        "UPDATE sessions SET name = ?1, description = ?2, status = ?3, metadata = ?4, updated_at = ?5 \
         WHERE id = ?6",
        params![
            session.name,
            session.description,
            session.status,
            serde_json::to_string(&session.metadata)?,
            format_timestamp(&session.updated_at),
            id,
        ],
    )?;
    tracing::debug!(id = %id, status = %session.status, "session updated");
    Ok(session)
}

pub fn delete_session(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StoreError::not_found("session", id));
    }
    tracing::info!(id = %id, "session deleted");
    Ok(())
}
