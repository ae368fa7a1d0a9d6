//! Bulk cleanup of memory entries.
//!
//! Each cleanup first selects candidates, then (unless `dry_run`) deletes them
//! in batches, one transaction per batch. A failing batch rolls back on its own
//! and stops the run; earlier batches stay deleted.

use chrono::Duration;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::db::{format_timestamp, now, Database};
use crate::error::Result;

/// Which entries a cleanup run targets.
#[derive(Debug, Clone, Copy)]
pub enum CleanupCriteria {
    /// Created more than `max_age_days` ago.
    Old { max_age_days: u32 },
    /// Priority and confidence both at or below the given ceilings.
    LowPriority {
        max_priority: i32,
        max_confidence: f64,
    },
    /// Last read more than `max_unused_days` ago and read fewer than
    /// `max_access_count` times.
    Unused {
        max_unused_days: u32,
        max_access_count: u32,
    },
}

impl CleanupCriteria {
    fn label(&self) -> &'static str {
        match self {
            Self::Old { .. } => "old",
            Self::LowPriority { .. } => "low_priority",
            Self::Unused { .. } => "unused",
        }
    }

    fn predicate(&self) -> (&'static str, Vec<Value>) {
        let cutoff = |days: u32| Value::Text(format_timestamp(&(now() - Duration::days(days as i64))));
        match *self {
            Self::Old { max_age_days } => ("created_at < ?1", vec![cutoff(max_age_days)]),
            Self::LowPriority {
                max_priority,
                max_confidence,
            } => (
                "priority <= ?1 AND confidence <= ?2",
                vec![
                    Value::Integer(max_priority as i64),
                    Value::Real(max_confidence),
                ],
            ),
            Self::Unused {
                max_unused_days,
                max_access_count,
            } => (
                "accessed_at < ?1 AND access_count < ?2",
                vec![
                    cutoff(max_unused_days),
                    Value::Integer(max_access_count as i64),
                ],
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CleanupResult {
    pub candidates: Vec<CleanupCandidate>,
    pub deleted: usize,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct CleanupCandidate {
    pub id: String,
    pub session_id: String,
    pub title: String,
    pub priority: i32,
    pub confidence: f64,
    pub access_count: u32,
    pub created_at: String,
    pub accessed_at: String,
}

fn find_candidates(conn: &Connection, criteria: &CleanupCriteria) -> Result<Vec<CleanupCandidate>> {
    let (predicate, values) = criteria.predicate();
    let mut stmt = conn.prepare(&format!(
        "SELECT id, session_id, title, priority, confidence, access_count, created_at, accessed_at \
         FROM memory_entries WHERE {predicate} ORDER BY created_at ASC"
    ))?;
    let candidates = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok(CleanupCandidate {
                id: row.get(0)?,
                session_id: row.get(1)?,
                title: row.get(2)?,
                priority: row.get(3)?,
                confidence: row.get(4)?,
                access_count: row.get(5)?,
                created_at: row.get(6)?,
                accessed_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(candidates)
}

fn delete_batch(conn: &Connection, ids: &[&str]) -> Result<usize> {
    let slots = (1..=ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let deleted = conn.execute(
        &format!("DELETE FROM memory_entries WHERE id IN ({slots})"),
        params_from_iter(ids.iter()),
    )?;
    Ok(deleted)
}

/// Find entries matching `criteria` and, unless `dry_run`, delete them in
/// batches of `batch_size`.
pub fn cleanup(
    db: &Database,
    criteria: CleanupCriteria,
    batch_size: usize,
    dry_run: bool,
) -> Result<CleanupResult> {
    let candidates = db.with_conn(|conn| find_candidates(conn, &criteria))?;

    if dry_run {
        tracing::info!(kind = criteria.label(), candidates = candidates.len(), "cleanup dry run");
        return Ok(CleanupResult {
            candidates,
            deleted: 0,
            dry_run: true,
        });
    }

    let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let mut deleted = 0;
    for batch in ids.chunks(batch_size.max(1)) {
        deleted += db.run_in_transaction(|conn| delete_batch(conn, batch))?;
    }

    tracing::info!(kind = criteria.label(), deleted, "cleanup complete");
    Ok(CleanupResult {
        candidates,
        deleted,
        dry_run: false,
    })
}

pub fn cleanup_old(db: &Database, max_age_days: u32, batch_size: usize, dry_run: bool) -> Result<CleanupResult> {
    cleanup(db, CleanupCriteria::Old { max_age_days }, batch_size, dry_run)
}

pub fn cleanup_low_priority(
    db: &Database,
    max_priority: i32,
    max_confidence: f64,
    batch_size: usize,
    dry_run: bool,
) -> Result<CleanupResult> {
    cleanup(
        db,
        CleanupCriteria::LowPriority {
            max_priority,
            max_confidence,
        },
        batch_size,
        dry_run,
    )
}

pub fn cleanup_unused(
    db: &Database,
    max_unused_days: u32,
    max_access_count: u32,
    batch_size: usize,
    dry_run: bool,
) -> Result<CleanupResult> {
    cleanup(
        db,
        CleanupCriteria::Unused {
            max_unused_days,
            max_access_count,
        },
        batch_size,
        dry_run,
    )
}
