//! Memory entry storage: create with defaults, read with access tracking,
//! filtered listing, partial update, delete, batch insert/update/delete, and
//! similarity and duplicate lookups.
//!
//! [`get_entry`] is the only read that counts as an access. It fetches the row
//! and then increments `access_count` in a second statement. Both statements
//! run under the caller's connection lock, so reads through one
//! [`Database`](crate::db::Database) never lose an increment; separate
//! processes sharing the file can. Listing, search, inspection, and export
//! never touch the counters.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;

use crate::db::{format_timestamp, now};
use crate::error::{or_not_found, Result, StoreError};
use crate::memory::relations::{self, NetworkEdge};
use crate::memory::types::{
    ContentType, CreateEntryRequest, EntryFilter, EntryUpdate, MemoryEntry, SessionStatus,
    TaskType, UpdateEntryRequest,
};
use crate::memory::{json_column, like_pattern, sql_limit, sql_offset, ts_column};

pub const DEFAULT_PRIORITY: i32 = 5;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Entry columns in table order, qualified with the `me` alias.
pub(crate) const ENTRY_COLUMNS: &str = "me.id, me.session_id, me.title, me.content, \
     me.content_type, me.category, me.priority, me.confidence, me.tags, me.source, \
     me.created_at, me.updated_at, me.accessed_at, me.access_count";

/// Map a row selected with [`ENTRY_COLUMNS`] (starting at column 0).
pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<MemoryEntry> {
    Ok(MemoryEntry {
        id: row.get(0)?,
        session_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        content_type: row.get(4)?,
        category: row.get(5)?,
        priority: row.get(6)?,
        confidence: row.get(7)?,
        tags: json_column(row, 8)?,
        source: row.get(9)?,
        created_at: ts_column(row, 10)?,
        updated_at: ts_column(row, 11)?,
        accessed_at: ts_column(row, 12)?,
        access_count: row.get(13)?,
    })
}

/// Build an entry from a request, applying defaults for "not provided" values.
pub(crate) fn entry_from_request(req: &CreateEntryRequest) -> MemoryEntry {
    let ts = now();
    MemoryEntry {
        id: uuid::Uuid::now_v7().to_string(),
        session_id: req.session_id.clone(),
        title: req.title.clone(),
        content: req.content.clone(),
        content_type: req.content_type.unwrap_or(ContentType::Text),
        category: req.category,
        priority: if req.priority == 0 {
            DEFAULT_PRIORITY
        } else {
            req.priority
        },
        confidence: if req.confidence == 0.0 {
            DEFAULT_CONFIDENCE
        } else {
            req.confidence
        },
        tags: req.tags.clone(),
        source: req.source.clone(),
        created_at: ts,
        updated_at: ts,
        accessed_at: ts,
        access_count: 0,
    }
}

/// Store a new memory entry and return it as persisted.
///
/// Out-of-range priority or confidence and unknown session ids are rejected by
/// the schema and surface as [`StoreError::ConstraintViolation`].
pub fn create_entry(conn: &Connection, req: &CreateEntryRequest) -> Result<MemoryEntry> {
    let entry = entry_from_request(req);
    insert_entry(conn, &entry)?;
    tracing::debug!(id = %entry.id, session_id = %entry.session_id, category = %entry.category, "memory entry stored");
    Ok(entry)
}

/// Store several entries for one session. Callers run this inside a
/// transaction so the batch is all-or-nothing.
pub fn batch_create_entries(
    conn: &Connection,
    session_id: &str,
    requests: &[CreateEntryRequest],
) -> Result<Vec<MemoryEntry>> {
    let mut created = Vec::with_capacity(requests.len());
    for req in requests {
        let mut req = req.clone();
        req.session_id = session_id.to_string();
        created.push(create_entry(conn, &req)?);
    }
    tracing::info!(session_id = %session_id, count = created.len(), "batch stored");
    Ok(created)
}

/// Insert a fully-formed entry row.
pub(crate) fn insert_entry(conn: &Connection, entry: &MemoryEntry) -> Result<()> {
    let tags = serde_json::to_string(&entry.tags)?;
    conn.execute(
        "INSERT INTO memory_entries (id, session_id, title, content, content_type, category, \
         priority, confidence, tags, source, created_at, updated_at, accessed_at, access_count) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            entry.id,
            entry.session_id,
            entry.title,
            entry.content,
            entry.content_type,
            entry.category,
            entry.priority,
            entry.confidence,
            tags,
            entry.source,
            format_timestamp(&entry.created_at),
            format_timestamp(&entry.updated_at),
            format_timestamp(&entry.accessed_at),
            entry.access_count,
        ],
    )?;
    Ok(())
}

/// Fetch an entry without touching its access counters.
pub fn peek_entry(conn: &Connection, id: &str) -> Result<MemoryEntry> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM memory_entries me WHERE me.id = ?1"),
        params![id],
        entry_from_row,
    )
    .map_err(|e| or_not_found(e, "memory entry", id))
}

/// Fetch an entry and record the access.
///
/// The returned entry carries the incremented count and the new access time.
pub fn get_entry(conn: &Connection, id: &str) -> Result<MemoryEntry> {
    let mut entry = peek_entry(conn, id)?;

    let ts = now();
    conn.execute(
        "UPDATE memory_entries SET access_count = access_count + 1, accessed_at = ?1 WHERE id = ?2",
        params![format_timestamp(&ts), id],
    )?;

    entry.access_count += 1;
    entry.accessed_at = ts;
    Ok(entry)
}

/// List entries newest first. Every tag in `filter.tags` must be present.
pub fn list_entries(conn: &Connection, filter: &EntryFilter) -> Result<Vec<MemoryEntry>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(session_id) = &filter.session_id {
        values.push(Value::Text(session_id.clone()));
        clauses.push(format!("me.session_id = ?{}", values.len()));
    }
    if !filter.categories.is_empty() {
        let mut slots = Vec::with_capacity(filter.categories.len());
        for category in &filter.categories {
            values.push(Value::Text(category.as_str().to_string()));
            slots.push(format!("?{}", values.len()));
        }
        clauses.push(format!("me.category IN ({})", slots.join(", ")));
    }
    for tag in &filter.tags {
        values.push(Value::Text(tag.clone()));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(me.tags) WHERE json_each.value = ?{})",
            values.len()
        ));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    values.push(Value::Integer(sql_limit(filter.limit)));
    let limit_slot = values.len();
    values.push(Value::Integer(sql_offset(filter.offset)));
    let offset_slot = values.len();

    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_entries me {where_clause} \
         ORDER BY me.created_at DESC, me.rowid DESC LIMIT ?{limit_slot} OFFSET ?{offset_slot}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params_from_iter(values.iter()), entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Apply a partial update. Bumps `updated_at`; does not count as an access.
pub fn update_entry(conn: &Connection, id: &str, patch: &UpdateEntryRequest) -> Result<MemoryEntry> {
    let mut entry = peek_entry(conn, id)?;

    if let Some(title) = &patch.title {
        entry.title = title.clone();
    }
    if let Some(content) = &patch.content {
        entry.content = content.clone();
    }
    if let Some(content_type) = patch.content_type {
        entry.content_type = content_type;
    }
    if let Some(category) = patch.category {
        entry.category = category;
    }
    if let Some(priority) = patch.priority {
        entry.priority = priority;
    }
    if let Some(confidence) = patch.confidence {
        entry.confidence = confidence;
    }
    if let Some(tags) = &patch.tags {
        entry.tags = tags.clone();
    }
    if let Some(source) = &patch.source {
        entry.source = source.clone();
    }
    entry.updated_at = now();

    conn.execute(
        "UPDATE memory_entries SET title = ?1, content = ?2, content_type = ?3, category = ?4, \
         priority = ?5, confidence = ?6, tags = ?7, source = ?8, updated_at = ?9 WHERE id = ?10",
        params![
            entry.title,
            entry.content,
            entry.content_type,
            entry.category,
            entry.priority,
            entry.confidence,
            serde_json::to_string(&entry.tags)?,
            entry.source,
            format_timestamp(&entry.updated_at),
            id,
        ],
    )?;
    tracing::debug!(id = %id, "memory entry updated");
    Ok(entry)
}

/// Delete an entry; its relationships go with it.
pub fn delete_entry(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM memory_entries WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StoreError::not_found("memory entry", id));
    }
    tracing::info!(id = %id, "memory entry deleted");
    Ok(())
}

/// Apply several partial updates. Callers run this inside a transaction; an
/// unknown id fails the whole batch with [`StoreError::NotFound`].
pub fn batch_update_entries(conn: &Connection, updates: &[EntryUpdate]) -> Result<Vec<MemoryEntry>> {
    let mut updated = Vec::with_capacity(updates.len());
    for update in updates {
        updated.push(update_entry(conn, &update.id, &update.patch)?);
    }
    tracing::info!(count = updated.len(), "batch updated");
    Ok(updated)
}

/// Delete every listed entry that exists. Unknown ids are skipped; returns the
/// number of rows removed.
pub fn batch_delete_entries(conn: &Connection, ids: &[String]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let slots: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let deleted = conn.execute(
        &format!("DELETE FROM memory_entries WHERE id IN ({})", slots.join(", ")),
        params_from_iter(ids.iter()),
    )?;
    tracing::info!(requested = ids.len(), deleted, "batch deleted");
    Ok(deleted)
}

/// Entries in a session whose title, content, or tags contain `text`
/// (case-insensitive), highest priority first. A blank `text` matches nothing.
pub fn find_similar_entries(
    conn: &Connection,
    session_id: &str,
    text: &str,
    limit: usize,
) -> Result<Vec<MemoryEntry>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_entries me WHERE me.session_id = ?1 \
         AND (me.title LIKE ?2 ESCAPE '\\' OR me.content LIKE ?2 ESCAPE '\\' \
              OR me.tags LIKE ?2 ESCAPE '\\') \
         ORDER BY me.priority DESC, me.confidence DESC, me.rowid DESC LIMIT ?3"
    ))?;
    let entries = stmt
        .query_map(
            params![session_id, like_pattern(text), limit as i64],
            entry_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Contents at or below this length never count as containing one another.
pub const DUPLICATE_MIN_CONTENT_CHARS: i64 = 50;
pub const DUPLICATE_LIMIT: usize = 5;

/// Likely duplicates of a prospective entry in the same session, newest first.
///
/// A match has the same title or the same content (ignoring case), or, when
/// both contents are longer than [`DUPLICATE_MIN_CONTENT_CHARS`], one content
/// contains the other.
pub fn check_duplicates(
    conn: &Connection,
    session_id: &str,
    title: &str,
    content: &str,
) -> Result<Vec<MemoryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_entries me WHERE me.session_id = ?1 \
         AND (lower(me.title) = lower(?2) \
              OR lower(me.content) = lower(?3) \
              OR (length(me.content) > ?4 AND length(?3) > ?4 \
                  AND (instr(lower(me.content), lower(?3)) > 0 \
                       OR instr(lower(?3), lower(me.content)) > 0))) \
         ORDER BY me.created_at DESC, me.rowid DESC LIMIT ?5"
    ))?;
    let entries = stmt
        .query_map(
            params![
                session_id,
                title,
                content,
                DUPLICATE_MIN_CONTENT_CHARS,
                DUPLICATE_LIMIT as i64
            ],
            entry_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if !entries.is_empty() {
        tracing::debug!(session_id = %session_id, matches = entries.len(), "possible duplicates");
    }
    Ok(entries)
}

/// An entry with its owning session and every edge touching it.
#[derive(Debug, Clone, Serialize)]
pub struct InspectedEntry {
    pub entry: MemoryEntry,
    pub session_name: String,
    pub session_task_type: TaskType,
    pub session_status: SessionStatus,
    pub relationships: Vec<NetworkEdge>,
}

/// Read an entry through the session view plus its relationship network.
/// No access tracking.
pub fn inspect_entry(conn: &Connection, id: &str) -> Result<InspectedEntry> {
    let (entry, session_name, session_task_type, session_status): (
        MemoryEntry,
        String,
        TaskType,
        SessionStatus,
    ) = conn
        .query_row(
            &format!(
                "SELECT {ENTRY_COLUMNS}, me.session_name, me.session_task_type, me.session_status \
                 FROM memory_entries_with_session me WHERE me.id = ?1"
            ),
            params![id],
            |row| Ok((entry_from_row(row)?, row.get(14)?, row.get(15)?, row.get(16)?)),
        )
        .map_err(|e| or_not_found(e, "memory entry", id))?;

    let relationships = relations::network_for_entry(conn, id)?;

    Ok(InspectedEntry {
        entry,
        session_name,
        session_task_type,
        session_status,
        relationships,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::memory::sessions::create_session;
    use crate::memory::types::{Category, CreateSessionRequest};

    fn setup() -> (Database, String) {
        let db = Database::open_in_memory(true).unwrap();
        let session_id = db
            .with_conn(|c| {
                create_session(
                    c,
                    &CreateSessionRequest {
                        name: "test".into(),
                        description: String::new(),
                        task_type: TaskType::SecurityReview,
                        metadata: None,
                    },
                )
            })
            .unwrap()
            .id;
        (db, session_id)
    }

    #[test]
    fn create_applies_defaults() {
        let (db, sid) = setup();
        let entry = db
            .with_conn(|c| {
                create_entry(c, &CreateEntryRequest::new(&sid, "t", "c", Category::Finding))
            })
            .unwrap();
        assert_eq!(entry.priority, 5);
        assert_eq!(entry.confidence, 0.5);
        assert_eq!(entry.content_type, ContentType::Text);
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.created_at, entry.accessed_at);
    }

    #[test]
    fn explicit_values_are_kept() {
        let (db, sid) = setup();
        let mut req = CreateEntryRequest::new(&sid, "t", "c", Category::Exploit);
        req.priority = 10;
        req.confidence = 1.0;
        req.content_type = Some(ContentType::Code);
        req.tags = vec!["rce".into(), "java".into()];
        let entry = db.with_conn(|c| create_entry(c, &req)).unwrap();
        let stored = db.with_conn(|c| peek_entry(c, &entry.id)).unwrap();
        assert_eq!(stored.priority, 10);
        assert_eq!(stored.confidence, 1.0);
        assert_eq!(stored.content_type, ContentType::Code);
        assert_eq!(stored.tags, vec!["rce", "java"]);
    }

    #[test]
    fn out_of_range_values_violate_constraints() {
        let (db, sid) = setup();
        for (priority, confidence) in [(11, 0.5), (-1, 0.5), (5, 1.5), (5, -0.1), (5, f64::NAN)] {
            let mut req = CreateEntryRequest::new(&sid, "t", "c", Category::Note);
            req.priority = priority;
            req.confidence = confidence;
            let err = db.with_conn(|c| create_entry(c, &req)).unwrap_err();
            assert!(
                err.is_constraint_violation(),
                "priority={priority} confidence={confidence}: {err:?}"
            );
        }
    }

    #[test]
    fn unknown_session_violates_foreign_key() {
        let (db, _) = setup();
        let req = CreateEntryRequest::new("no-such-session", "t", "c", Category::Note);
        let err = db.with_conn(|c| create_entry(c, &req)).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn get_tracks_access_but_peek_does_not() {
        let (db, sid) = setup();
        let entry = db
            .with_conn(|c| create_entry(c, &CreateEntryRequest::new(&sid, "t", "c", Category::Note)))
            .unwrap();

        let first = db.with_conn(|c| get_entry(c, &entry.id)).unwrap();
        assert_eq!(first.access_count, 1);
        let second = db.with_conn(|c| get_entry(c, &entry.id)).unwrap();
        assert_eq!(second.access_count, 2);
        assert!(second.accessed_at >= first.accessed_at);

        let peeked = db.with_conn(|c| peek_entry(c, &entry.id)).unwrap();
        assert_eq!(peeked.access_count, 2);
        assert_eq!(peeked.accessed_at, second.accessed_at);
    }

    #[test]
    fn get_missing_entry_is_not_found() {
        let (db, _) = setup();
        let err = db.with_conn(|c| get_entry(c, "missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn list_filters_by_category_and_all_tags() {
        let (db, sid) = setup();
        db.with_conn(|c| {
            let mut a = CreateEntryRequest::new(&sid, "a", "c", Category::Vulnerability);
            a.tags = vec!["web".into(), "sqli".into()];
            create_entry(c, &a)?;
            let mut b = CreateEntryRequest::new(&sid, "b", "c", Category::Vulnerability);
            b.tags = vec!["web".into()];
            create_entry(c, &b)?;
            create_entry(c, &CreateEntryRequest::new(&sid, "n", "c", Category::Note))?;

            let vulns = list_entries(
                c,
                &EntryFilter {
                    session_id: Some(sid.clone()),
                    categories: vec![Category::Vulnerability],
                    ..Default::default()
                },
            )?;
            assert_eq!(vulns.len(), 2);
            assert_eq!(vulns[0].title, "b");

            let both_tags = list_entries(
                c,
                &EntryFilter {
                    tags: vec!["web".into(), "sqli".into()],
                    ..Default::default()
                },
            )?;
            assert_eq!(both_tags.len(), 1);
            assert_eq!(both_tags[0].title, "a");

            let page = list_entries(
                c,
                &EntryFilter {
                    limit: Some(1),
                    offset: Some(1),
                    ..Default::default()
                },
            )?;
            assert_eq!(page.len(), 1);
            assert_eq!(page[0].title, "b");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn update_changes_fields_without_access() {
        let (db, sid) = setup();
        let entry = db
            .with_conn(|c| create_entry(c, &CreateEntryRequest::new(&sid, "t", "c", Category::Hypothesis)))
            .unwrap();
        let updated = db
            .with_conn(|c| {
                update_entry(
                    c,
                    &entry.id,
                    &UpdateEntryRequest {
                        category: Some(Category::Evidence),
                        confidence: Some(0.9),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        assert_eq!(updated.category, Category::Evidence);
        assert_eq!(updated.title, "t");
        assert_eq!(updated.access_count, 0);

        let err = db
            .with_conn(|c| {
                update_entry(
                    c,
                    &entry.id,
                    &UpdateEntryRequest {
                        priority: Some(42),
                        ..Default::default()
                    },
                )
            })
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn batch_is_all_or_nothing_in_a_transaction() {
        let (db, sid) = setup();
        let good = CreateEntryRequest::new(&sid, "ok", "c", Category::Note);
        let mut bad = CreateEntryRequest::new(&sid, "bad", "c", Category::Note);
        bad.priority = 99;

        let err = db
            .run_in_transaction(|c| batch_create_entries(c, &sid, &[good.clone(), bad]))
            .unwrap_err();
        assert!(err.is_constraint_violation());
        let count = db
            .with_conn(|c| list_entries(c, &EntryFilter::default()))
            .unwrap()
            .len();
        assert_eq!(count, 0);

        let created = db
            .run_in_transaction(|c| batch_create_entries(c, &sid, &[good.clone(), good]))
            .unwrap();
        assert_eq!(created.len(), 2);
    }

    #[test]
    fn inspect_includes_session_and_does_not_track() {
        let (db, sid) = setup();
        let entry = db
            .with_conn(|c| create_entry(c, &CreateEntryRequest::new(&sid, "t", "c", Category::Tool)))
            .unwrap();
        let inspected = db.with_conn(|c| inspect_entry(c, &entry.id)).unwrap();
        assert_eq!(inspected.session_name, "test");
        assert_eq!(inspected.session_task_type, TaskType::SecurityReview);
        assert_eq!(inspected.entry.access_count, 0);
        assert!(inspected.relationships.is_empty());
    }

    #[test]
    fn delete_removes_entry() {
        let (db, sid) = setup();
        let entry = db
            .with_conn(|c| create_entry(c, &CreateEntryRequest::new(&sid, "t", "c", Category::Note)))
            .unwrap();
        db.with_conn(|c| delete_entry(c, &entry.id)).unwrap();
        assert!(db.with_conn(|c| peek_entry(c, &entry.id)).unwrap_err().is_not_found());
        assert!(db.with_conn(|c| delete_entry(c, &entry.id)).unwrap_err().is_not_found());
    }

    fn store(db: &Database, sid: &str, title: &str, content: &str, priority: i32) -> MemoryEntry {
        let mut req = CreateEntryRequest::new(sid, title, content, Category::Finding);
        req.priority = priority;
        db.with_conn(|c| create_entry(c, &req)).unwrap()
    }

    #[test]
    fn similar_entries_match_any_text_field() {
        let (db, sid) = setup();
        store(&db, &sid, "Stored XSS in comments", "script tag persists", 7);
        store(&db, &sid, "Reflected input", "xss via q param", 9);
        let mut tagged = CreateEntryRequest::new(&sid, "Cookie flags", "missing HttpOnly", Category::Finding);
        tagged.tags = vec!["xss-adjacent".into()];
        db.with_conn(|c| create_entry(c, &tagged)).unwrap();
        store(&db, &sid, "Open port", "22/tcp", 10);

        let similar = db
            .with_conn(|c| find_similar_entries(c, &sid, "XSS", 10))
            .unwrap();
        let titles: Vec<_> = similar.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Reflected input", "Stored XSS in comments", "Cookie flags"]);

        assert!(db.with_conn(|c| find_similar_entries(c, &sid, "  ", 10)).unwrap().is_empty());
        assert!(db.with_conn(|c| find_similar_entries(c, "other", "xss", 10)).unwrap().is_empty());
    }

    #[test]
    fn duplicates_by_title_content_or_containment() {
        let (db, sid) = setup();
        let long = "The login endpoint returns distinct errors for unknown users and bad passwords";
        let by_title = store(&db, &sid, "User enumeration", "short", 5);
        let by_containment = store(&db, &sid, "Verbose login errors", long, 5);
        store(&db, &sid, "Unrelated", "nothing alike", 5);

        let dupes = db
            .with_conn(|c| check_duplicates(c, &sid, "user ENUMERATION", "different"))
            .unwrap();
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].id, by_title.id);

        let longer = format!("{long}, confirmed on staging.");
        let dupes = db
            .with_conn(|c| check_duplicates(c, &sid, "New title", &longer))
            .unwrap();
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].id, by_containment.id);

        // short contents never match by containment
        let dupes = db
            .with_conn(|c| check_duplicates(c, &sid, "x", "nothing"))
            .unwrap();
        assert!(dupes.is_empty());
    }

    #[test]
    fn batch_update_and_delete() {
        let (db, sid) = setup();
        let a = store(&db, &sid, "a", "c", 3);
        let b = store(&db, &sid, "b", "c", 3);

        let updated = db
            .run_in_transaction(|c| {
                batch_update_entries(
                    c,
                    &[
                        EntryUpdate {
                            id: a.id.clone(),
                            patch: UpdateEntryRequest {
                                priority: Some(8),
                                ..Default::default()
                            },
                        },
                        EntryUpdate {
                            id: b.id.clone(),
                            patch: UpdateEntryRequest {
                                title: Some("b2".into()),
                                ..Default::default()
                            },
                        },
                    ],
                )
            })
            .unwrap();
        assert_eq!(updated[0].priority, 8);
        assert_eq!(updated[1].title, "b2");

        let err = db
            .run_in_transaction(|c| {
                batch_update_entries(
                    c,
                    &[
                        EntryUpdate {
                            id: a.id.clone(),
                            patch: UpdateEntryRequest {
                                priority: Some(1),
                                ..Default::default()
                            },
                        },
                        EntryUpdate {
                            id: "missing".into(),
                            patch: UpdateEntryRequest::default(),
                        },
                    ],
                )
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(db.with_conn(|c| peek_entry(c, &a.id)).unwrap().priority, 8);

        let deleted = db
            .with_conn(|c| batch_delete_entries(c, &[a.id.clone(), "missing".into(), b.id.clone()]))
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.with_conn(|c| batch_delete_entries(c, &[])).unwrap(), 0);
    }
}
