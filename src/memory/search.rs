//! Ranked, multi-strategy search over memory entries.
//!
//! Filters (session, categories, minimum priority, minimum confidence) are
//! AND-combined with one text predicate chosen by [`SearchType`]:
//!
//! | Strategy | Predicate |
//! |----------|-----------|
//! | `semantic`, `fuzzy` | FTS5 `MATCH` on title, content, tags; substring fallback without the index |
//! | `exact` | case-insensitive substring on title, content, serialized tags |
//! | `tag` | case-insensitive substring on serialized tags |
//! | none | filters only |
//!
//! Rows come back ordered by priority, confidence, then last access (all
//! descending). Each carries a [`relevance_score`] that is reported but does
//! not affect the order. Searching is not an access.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;

use crate::db::{format_timestamp, now};
use crate::error::Result;
use crate::memory::store::{entry_from_row, ENTRY_COLUMNS};
use crate::memory::types::{MemoryEntry, SearchIndexCapability, SearchRequest, SearchType};
use crate::memory::{like_pattern, sql_limit, sql_offset};

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub entry: MemoryEntry,
    /// Deterministic score in `[0, 1]`.
    pub relevance: f64,
}

/// Run a search. Writes a `search_history` row when the request names both a
/// session and a search type and that session exists.
pub fn search(
    conn: &Connection,
    capability: SearchIndexCapability,
    req: &SearchRequest,
) -> Result<Vec<SearchResult>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(session_id) = &req.session_id {
        values.push(Value::Text(session_id.clone()));
        clauses.push(format!("me.session_id = ?{}", values.len()));
    }
    if !req.categories.is_empty() {
        let mut slots = Vec::with_capacity(req.categories.len());
        for category in &req.categories {
            values.push(Value::Text(category.as_str().to_string()));
            slots.push(format!("?{}", values.len()));
        }
        clauses.push(format!("me.category IN ({})", slots.join(", ")));
    }
    if let Some(min_priority) = req.min_priority {
        values.push(Value::Integer(min_priority as i64));
        clauses.push(format!("me.priority >= ?{}", values.len()));
    }
    if let Some(min_confidence) = req.min_confidence {
        values.push(Value::Real(min_confidence));
        clauses.push(format!("me.confidence >= ?{}", values.len()));
    }
    if let Some(search_type) = req.search_type {
        if let Some((clause, value)) = text_predicate(search_type, capability, &req.query, values.len() + 1) {
            values.push(value);
            clauses.push(clause);
        }
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    values.push(Value::Integer(sql_limit(req.limit)));
    let limit_slot = values.len();
    values.push(Value::Integer(sql_offset(req.offset)));
    let offset_slot = values.len();

    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM memory_entries me {where_clause} \
         ORDER BY me.priority DESC, me.confidence DESC, me.accessed_at DESC, me.rowid DESC \
         LIMIT ?{limit_slot} OFFSET ?{offset_slot}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params_from_iter(values.iter()), entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let ts = now();
    let results: Vec<SearchResult> = entries
        .into_iter()
        .map(|entry| {
            let relevance = relevance_score(&entry, &req.query, ts);
            SearchResult { entry, relevance }
        })
        .collect();

    if let (Some(session_id), Some(search_type)) = (&req.session_id, req.search_type) {
        record_search(conn, session_id, &req.query, search_type, results.len(), ts)?;
    }

    tracing::debug!(
        query = %req.query,
        search_type = ?req.search_type,
        capability = ?capability,
        results = results.len(),
        "search complete"
    );
    Ok(results)
}

/// Pick the text predicate for a strategy. `None` when the query is blank.
fn text_predicate(
    search_type: SearchType,
    capability: SearchIndexCapability,
    query: &str,
    slot: usize,
) -> Option<(String, Value)> {
    if query.trim().is_empty() {
        return None;
    }
    let substring = |slot: usize| {
        format!(
            "(me.title LIKE ?{slot} ESCAPE '\\' OR me.content LIKE ?{slot} ESCAPE '\\' \
             OR me.tags LIKE ?{slot} ESCAPE '\\')"
        )
    };

    match (search_type, capability) {
        (SearchType::Semantic | SearchType::Fuzzy, SearchIndexCapability::Indexed) => {
            let escaped = escape_fts_query(query);
            if escaped.is_empty() {
                return None;
            }
            Some((
                format!(
                    "me.rowid IN (SELECT rowid FROM memory_entries_fts \
                     WHERE memory_entries_fts MATCH ?{slot})"
                ),
                Value::Text(escaped),
            ))
        }
        (SearchType::Semantic | SearchType::Fuzzy, SearchIndexCapability::None)
        | (SearchType::Exact, _) => Some((substring(slot), Value::Text(like_pattern(query)))),
        (SearchType::Tag, _) => Some((
            format!("me.tags LIKE ?{slot} ESCAPE '\\'"),
            Value::Text(like_pattern(query)),
        )),
    }
}

fn record_search(
    conn: &Connection,
    session_id: &str,
    query: &str,
    search_type: SearchType,
    results_count: usize,
    ts: DateTime<Utc>,
) -> Result<()> {
    // An unknown session simply gets no history row.
    conn.execute(
        "INSERT INTO search_history (id, session_id, query, search_type, results_count, created_at) \
         SELECT ?1, ?2, ?3, ?4, ?5, ?6 WHERE EXISTS (SELECT 1 FROM sessions WHERE id = ?2)",
        params![
            uuid::Uuid::now_v7().to_string(),
            session_id,
            query,
            search_type,
            results_count as i64,
            format_timestamp(&ts)
        ],
    )?;
    Ok(())
}

/// Deterministic relevance in `[0, 1]`.
///
/// ```text
/// priority * 0.04 + confidence * 0.3
///   + 0.2 / (1 + days_since_access / 30)
///   + 0.1 / (1 + access_count / 10)
///   + 0.2 if query ⊂ title, + 0.1 if query ⊂ content (case-insensitive)
/// ```
///
/// An empty query is a substring of everything and earns both text bonuses.
pub fn relevance_score(entry: &MemoryEntry, query: &str, now: DateTime<Utc>) -> f64 {
    let days = ((now - entry.accessed_at).num_milliseconds() as f64 / MS_PER_DAY).max(0.0);
    let needle = query.to_lowercase();

    let mut score = entry.priority as f64 * 0.04
        + entry.confidence * 0.3
        + 1.0 / (1.0 + days / 30.0) * 0.2
        + 1.0 / (1.0 + entry.access_count as f64 / 10.0) * 0.1;

    if entry.title.to_lowercase().contains(&needle) {
        score += 0.2;
    }
    if entry.content.to_lowercase().contains(&needle) {
        score += 0.1;
    }

    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Escape a user query for FTS5 MATCH syntax.
///
/// Wraps each whitespace-delimited word in double quotes so FTS5 treats them
/// as plain terms (implicit AND). Strips empty tokens.
fn escape_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| {
            let clean = word.replace('"', "");
            format!("\"{clean}\"")
        })
        .filter(|w| w != "\"\"")
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::memory::sessions::create_session;
    use crate::memory::store::{create_entry, peek_entry};
    use crate::memory::types::{Category, ContentType, CreateEntryRequest, CreateSessionRequest, TaskType};
    use chrono::Duration;

    fn sample_entry(priority: i32, confidence: f64, access_count: u32, days_ago: i64) -> MemoryEntry {
        let now = Utc::now();
        MemoryEntry {
            id: "e".into(),
            session_id: "s".into(),
            title: "SQL Injection in login".into(),
            content: "The username parameter is injectable".into(),
            content_type: ContentType::Text,
            category: Category::Vulnerability,
            priority,
            confidence,
            tags: vec![],
            source: String::new(),
            created_at: now,
            updated_at: now,
            accessed_at: now - Duration::days(days_ago),
            access_count,
        }
    }

    #[test]
    fn relevance_is_bounded() {
        let now = Utc::now();
        for priority in [0, 5, 10] {
            for confidence in [0.0, 0.5, 1.0] {
                for access in [0, 10, 1000] {
                    for days in [-5, 0, 30, 10_000] {
                        let e = sample_entry(priority, confidence, access, days);
                        for q in ["", "sql", "nothing matches", "INJECTABLE"] {
                            let s = relevance_score(&e, q, now);
                            assert!((0.0..=1.0).contains(&s), "score {s} out of range");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn relevance_components() {
        let e = sample_entry(5, 0.5, 0, 0);
        let now = e.accessed_at;
        // 0.2 + 0.15 + 0.2 + 0.1 = 0.65 with no text match
        let base = relevance_score(&e, "zzz", now);
        assert!((base - 0.65).abs() < 1e-9, "{base}");
        // title bonus only: "login" appears in title, not content
        let title = relevance_score(&e, "LOGIN", now);
        assert!((title - 0.85).abs() < 1e-9, "{title}");
        // content bonus only
        let content = relevance_score(&e, "username", now);
        assert!((content - 0.75).abs() < 1e-9, "{content}");
        // 30 days since access halves the recency term
        let older = sample_entry(5, 0.5, 0, 30);
        let aged = relevance_score(&older, "zzz", now);
        assert!((aged - 0.55).abs() < 1e-6, "{aged}");
    }

    #[test]
    fn escape_fts_query_quotes_terms() {
        assert_eq!(escape_fts_query("sql injection"), "\"sql\" \"injection\"");
        assert_eq!(escape_fts_query("a\"b OR"), "\"ab\" \"OR\"");
        assert_eq!(escape_fts_query("  \" "), "");
    }

    fn seeded(full_text: bool) -> (Database, String) {
        let db = Database::open_in_memory(full_text).unwrap();
        let sid = db
            .with_conn(|c| {
                let s = create_session(
                    c,
                    &CreateSessionRequest {
                        name: "s".into(),
                        description: String::new(),
                        task_type: TaskType::PenetrationTest,
                        metadata: None,
                    },
                )?;
                for (title, content, tags, priority, confidence) in [
                    ("SQL injection", "login form", vec!["web", "sqli"], 9, 0.9),
                    ("XSS in search", "reflected payload", vec!["web"], 7, 0.8),
                    ("Open port 22", "ssh banner", vec!["network"], 3, 0.6),
                    ("Weak TLS", "sql server uses TLS 1.0", vec!["crypto"], 7, 0.95),
                ] {
                    let mut req = CreateEntryRequest::new(&s.id, title, content, Category::Finding);
                    req.tags = tags.into_iter().map(String::from).collect();
                    req.priority = priority;
                    req.confidence = confidence;
                    create_entry(c, &req)?;
                }
                Ok(s.id)
            })
            .unwrap();
        (db, sid)
    }

    fn run(db: &Database, req: SearchRequest) -> Vec<SearchResult> {
        db.with_conn(|c| search(c, db.capability(), &req)).unwrap()
    }

    fn titles(results: &[SearchResult]) -> Vec<String> {
        results.iter().map(|r| r.entry.title.clone()).collect()
    }

    #[test]
    fn filters_only_orders_by_priority_then_confidence() {
        let (db, _) = seeded(true);
        let results = run(&db, SearchRequest::default());
        assert_eq!(
            titles(&results),
            vec!["SQL injection", "Weak TLS", "XSS in search", "Open port 22"]
        );
        for pair in results.windows(2) {
            let (a, b) = (&pair[0].entry, &pair[1].entry);
            assert!((a.priority, a.confidence) >= (b.priority, b.confidence));
        }
    }

    #[test]
    fn exact_matches_case_insensitive_substring() {
        let (db, _) = seeded(true);
        let results = run(
            &db,
            SearchRequest {
                query: "SQL".into(),
                search_type: Some(SearchType::Exact),
                ..Default::default()
            },
        );
        assert_eq!(titles(&results), vec!["SQL injection", "Weak TLS"]);
    }

    #[test]
    fn tag_search_only_looks_at_tags() {
        let (db, _) = seeded(true);
        let results = run(
            &db,
            SearchRequest {
                query: "web".into(),
                search_type: Some(SearchType::Tag),
                ..Default::default()
            },
        );
        assert_eq!(titles(&results), vec!["SQL injection", "XSS in search"]);
    }

    #[test]
    fn semantic_uses_full_text_index() {
        let (db, _) = seeded(true);
        assert_eq!(db.capability(), SearchIndexCapability::Indexed);
        let results = run(
            &db,
            SearchRequest {
                query: "reflected".into(),
                search_type: Some(SearchType::Semantic),
                ..Default::default()
            },
        );
        assert_eq!(titles(&results), vec!["XSS in search"]);
    }

    #[test]
    fn semantic_without_index_matches_exact() {
        let (db, _) = seeded(false);
        assert_eq!(db.capability(), SearchIndexCapability::None);
        let query = |search_type| SearchRequest {
            query: "sql".into(),
            search_type: Some(search_type),
            ..Default::default()
        };
        let semantic = run(&db, query(SearchType::Semantic));
        let exact = run(&db, query(SearchType::Exact));
        assert_eq!(titles(&semantic), titles(&exact));
        assert_eq!(semantic.len(), 2);
    }

    #[test]
    fn numeric_filters_and_pagination() {
        let (db, _) = seeded(true);
        let results = run(
            &db,
            SearchRequest {
                min_priority: Some(7),
                min_confidence: Some(0.85),
                ..Default::default()
            },
        );
        assert_eq!(titles(&results), vec!["SQL injection", "Weak TLS"]);

        let page = run(
            &db,
            SearchRequest {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(titles(&page), vec!["Weak TLS", "XSS in search"]);
    }

    #[test]
    fn like_wildcards_are_literal() {
        let (db, _) = seeded(true);
        let results = run(
            &db,
            SearchRequest {
                query: "%".into(),
                search_type: Some(SearchType::Exact),
                ..Default::default()
            },
        );
        assert!(results.is_empty());
    }

    #[test]
    fn search_records_history_and_skips_access_tracking() {
        let (db, sid) = seeded(true);
        let results = run(
            &db,
            SearchRequest {
                query: "sql".into(),
                session_id: Some(sid.clone()),
                search_type: Some(SearchType::Exact),
                ..Default::default()
            },
        );
        let history: (i64, String) = db
            .with_conn(|c| {
                Ok(c.query_row(
                    "SELECT results_count, search_type FROM search_history WHERE session_id = ?1",
                    [&sid],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(history, (2, "exact".to_string()));

        let stored = db
            .with_conn(|c| peek_entry(c, &results[0].entry.id))
            .unwrap();
        assert_eq!(stored.access_count, 0);

        // no search type: no history row
        run(
            &db,
            SearchRequest {
                session_id: Some(sid.clone()),
                ..Default::default()
            },
        );
        let rows: i64 = db
            .with_conn(|c| Ok(c.query_row("SELECT COUNT(*) FROM search_history", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn unknown_session_searches_to_empty_without_history() {
        let (db, _) = seeded(true);
        let results = run(
            &db,
            SearchRequest {
                query: "sql".into(),
                session_id: Some("no-such-session".into()),
                search_type: Some(SearchType::Exact),
                ..Default::default()
            },
        );
        assert!(results.is_empty());
        let rows: i64 = db
            .with_conn(|c| Ok(c.query_row("SELECT COUNT(*) FROM search_history", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
