//! Relationship graph between memory entries.
//!
//! Edges are directed and typed, with a strength in `[0, 1]`. The
//! (source, target, type) triple is unique: storing it twice is a constraint
//! violation, not an upsert. Traversal via [`get_related_entries`] ignores
//! direction.

use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::db::{format_timestamp, now};
use crate::error::{or_not_found, Result, StoreError};
use crate::memory::store::{entry_from_row, ENTRY_COLUMNS};
use crate::memory::types::{
    Category, CreateRelationshipRequest, MemoryEntry, Relationship, RelationshipType,
};
use crate::memory::ts_column;

pub const DEFAULT_STRENGTH: f64 = 0.5;

const RELATIONSHIP_COLUMNS: &str =
    "id, source_entry_id, target_entry_id, relationship_type, strength, description, created_at";

fn relationship_from_row(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    Ok(Relationship {
        id: row.get(0)?,
        source_entry_id: row.get(1)?,
        target_entry_id: row.get(2)?,
        relationship_type: row.get(3)?,
        strength: row.get(4)?,
        description: row.get(5)?,
        created_at: ts_column(row, 6)?,
    })
}

/// An edge from the `relationship_network` view, with both endpoints' titles.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkEdge {
    pub relationship: Relationship,
    pub session_id: String,
    pub source_title: String,
    pub source_category: Category,
    pub target_title: String,
    pub target_category: Category,
}

const NETWORK_COLUMNS: &str = "id, source_entry_id, target_entry_id, relationship_type, \
     strength, description, created_at, session_id, source_title, source_category, \
     target_title, target_category";

fn network_edge_from_row(row: &Row<'_>) -> rusqlite::Result<NetworkEdge> {
    Ok(NetworkEdge {
        relationship: relationship_from_row(row)?,
        session_id: row.get(7)?,
        source_title: row.get(8)?,
        source_category: row.get(9)?,
        target_title: row.get(10)?,
        target_category: row.get(11)?,
    })
}

/// Create a directed edge. Missing endpoints and duplicate triples are
/// constraint violations.
pub fn create_relationship(
    conn: &Connection,
    req: &CreateRelationshipRequest,
) -> Result<Relationship> {
    let relationship = Relationship {
        id: uuid::Uuid::now_v7().to_string(),
        source_entry_id: req.source_entry_id.clone(),
        target_entry_id: req.target_entry_id.clone(),
        relationship_type: req.relationship_type,
        strength: req.strength.unwrap_or(DEFAULT_STRENGTH),
        description: req.description.clone(),
        created_at: now(),
    };
    insert_relationship(conn, &relationship)?;
    tracing::debug!(
        id = %relationship.id,
        source = %relationship.source_entry_id,
        target = %relationship.target_entry_id,
        kind = %relationship.relationship_type,
        "relationship stored"
    );
    Ok(relationship)
}

pub(crate) fn insert_relationship(conn: &Connection, rel: &Relationship) -> Result<()> {
    conn.execute(
        "INSERT INTO relationships (id, source_entry_id, target_entry_id, relationship_type, \
         strength, description, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            rel.id,
            rel.source_entry_id,
            rel.target_entry_id,
            rel.relationship_type,
            rel.strength,
            rel.description,
            format_timestamp(&rel.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_relationship(conn: &Connection, id: &str) -> Result<Relationship> {
    conn.query_row(
        &format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE id = ?1"),
        params![id],
        relationship_from_row,
    )
    .map_err(|e| or_not_found(e, "relationship", id))
}

pub fn delete_relationship(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM relationships WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StoreError::not_found("relationship", id));
    }
    Ok(())
}

/// Every edge touching `entry_id`, in either direction, strongest first.
pub fn list_relationships(conn: &Connection, entry_id: &str) -> Result<Vec<Relationship>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RELATIONSHIP_COLUMNS} FROM relationships \
         WHERE source_entry_id = ?1 OR target_entry_id = ?1 \
         ORDER BY strength DESC, created_at DESC"
    ))?;
    let rels = stmt
        .query_map(params![entry_id], relationship_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rels)
}

/// Entries connected to `entry_id` by any edge, either direction.
///
/// An entry linked by several edges appears once, ranked by its strongest
/// edge. Ordered by that strength, then by entry priority.
pub fn get_related_entries(
    conn: &Connection,
    entry_id: &str,
    relationship_type: Option<RelationshipType>,
    limit: usize,
) -> Result<Vec<MemoryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS}, MAX(r.strength) AS best_strength \
         FROM relationships r \
         JOIN memory_entries me ON me.id = CASE \
             WHEN r.source_entry_id = ?1 THEN r.target_entry_id \
             ELSE r.source_entry_id END \
         WHERE (r.source_entry_id = ?1 OR r.target_entry_id = ?1) \
           AND me.id != ?1 \
           AND (?2 IS NULL OR r.relationship_type = ?2) \
         GROUP BY me.id \
         ORDER BY best_strength DESC, me.priority DESC \
         LIMIT ?3"
    ))?;
    let entries = stmt
        .query_map(
            params![entry_id, relationship_type, limit as i64],
            entry_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Edges touching one entry, from the network view.
pub fn network_for_entry(conn: &Connection, entry_id: &str) -> Result<Vec<NetworkEdge>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NETWORK_COLUMNS} FROM relationship_network \
         WHERE source_entry_id = ?1 OR target_entry_id = ?1 \
         ORDER BY strength DESC"
    ))?;
    let edges = stmt
        .query_map(params![entry_id], network_edge_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(edges)
}

/// The relationship network, optionally limited to one session (by source entry).
pub fn relationship_network(
    conn: &Connection,
    session_id: Option<&str>,
) -> Result<Vec<NetworkEdge>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NETWORK_COLUMNS} FROM relationship_network \
         WHERE ?1 IS NULL OR session_id = ?1 \
         ORDER BY strength DESC, created_at DESC"
    ))?;
    let edges = stmt
        .query_map(params![session_id], network_edge_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(edges)
}
