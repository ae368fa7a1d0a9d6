//! Task progress tracking for multi-stage work within a session.
//!
//! `started_at` is stamped the first time a task is `in_progress` and
//! `completed_at` the first time it is `completed`; later transitions never
//! overwrite either.

use rusqlite::{params, Connection, Row};

use crate::db::{format_timestamp, now};
use crate::error::{or_not_found, Result};
use crate::memory::types::{CreateTaskRequest, TaskProgress, TaskStatus, UpdateTaskRequest};
use crate::memory::{opt_ts_column, sql_limit, sql_offset, ts_column};

const TASK_COLUMNS: &str = "id, session_id, task_name, stage, status, progress_percentage, \
     notes, started_at, completed_at, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskProgress> {
    Ok(TaskProgress {
        id: row.get(0)?,
        session_id: row.get(1)?,
        task_name: row.get(2)?,
        stage: row.get(3)?,
        status: row.get(4)?,
        progress_percentage: row.get(5)?,
        notes: row.get(6)?,
        started_at: opt_ts_column(row, 7)?,
        completed_at: opt_ts_column(row, 8)?,
        created_at: ts_column(row, 9)?,
        updated_at: ts_column(row, 10)?,
    })
}

pub fn create_task(conn: &Connection, req: &CreateTaskRequest) -> Result<TaskProgress> {
    let ts = now();
    let status = req.status.unwrap_or(TaskStatus::Pending);
    let mut task = TaskProgress {
        id: uuid::Uuid::now_v7().to_string(),
        session_id: req.session_id.clone(),
        task_name: req.task_name.clone(),
        stage: req.stage.clone(),
        status,
        progress_percentage: req.progress_percentage,
        notes: req.notes.clone(),
        started_at: None,
        completed_at: None,
        created_at: ts,
        updated_at: ts,
    };
    stamp_transitions(&mut task);
    insert_task(conn, &task)?;
    tracing::debug!(id = %task.id, session_id = %task.session_id, status = %task.status, "task created");
    Ok(task)
}

pub(crate) fn insert_task(conn: &Connection, task: &TaskProgress) -> Result<()> {
    conn.execute(
        "INSERT INTO task_progress (id, session_id, task_name, stage, status, progress_percentage, \
         notes, started_at, completed_at, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            task.id,
            task.session_id,
            task.task_name,
            task.stage,
            task.status,
            task.progress_percentage,
            task.notes,
            task.started_at.as_ref().map(format_timestamp),
            task.completed_at.as_ref().map(format_timestamp),
            format_timestamp(&task.created_at),
            format_timestamp(&task.updated_at),
        ],
    )?;
    Ok(())
}

/// Set first-transition timestamps for the task's current status.
fn stamp_transitions(task: &mut TaskProgress) {
    match task.status {
        TaskStatus::InProgress if task.started_at.is_none() => {
            task.started_at = Some(task.updated_at);
        }
        TaskStatus::Completed if task.completed_at.is_none() => {
            task.completed_at = Some(task.updated_at);
        }
        _ => {}
    }
}

pub fn get_task(conn: &Connection, id: &str) -> Result<TaskProgress> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM task_progress WHERE id = ?1"),
        params![id],
        task_from_row,
    )
    .map_err(|e| or_not_found(e, "task", id))
}

pub fn update_task(conn: &Connection, id: &str, patch: &UpdateTaskRequest) -> Result<TaskProgress> {
    let mut task = get_task(conn, id)?;

    if let Some(stage) = &patch.stage {
        task.stage = stage.clone();
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(progress) = patch.progress_percentage {
        task.progress_percentage = progress;
    }
    if let Some(notes) = &patch.notes {
        task.notes = notes.clone();
    }
    task.updated_at = now();
    stamp_transitions(&mut task);

    conn.execute(
        "UPDATE task_progress SET stage = ?1, status = ?2, progress_percentage = ?3, notes = ?4, \
         started_at = ?5, completed_at = ?6, updated_at = ?7 WHERE id = ?8",
        params![
            task.stage,
            task.status,
            task.progress_percentage,
            task.notes,
            task.started_at.as_ref().map(format_timestamp),
            task.completed_at.as_ref().map(format_timestamp),
            format_timestamp(&task.updated_at),
            id,
        ],
    )?;
    tracing::debug!(id = %id, status = %task.status, progress = task.progress_percentage, "task updated");
    Ok(task)
}

/// A session's tasks, newest first, optionally filtered by status.
pub fn list_tasks(
    conn: &Connection,
    session_id: &str,
    status: Option<TaskStatus>,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<Vec<TaskProgress>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM task_progress \
         WHERE session_id = ?1 AND (?2 IS NULL OR status = ?2) \
         ORDER BY created_at DESC, rowid DESC LIMIT ?3 OFFSET ?4"
    ))?;
    let tasks = stmt
        .query_map(
            params![session_id, status, sql_limit(limit), sql_offset(offset)],
            task_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tasks)
}
