mod helpers;

use helpers::{create_session, insert_entry, test_brain, test_brain_without_fts};
use tinybrain::memory::types::{Category, SearchIndexCapability, SearchRequest, SearchType};
use tinybrain::TinyBrain;

fn seed(brain: &TinyBrain) -> String {
    let sid = create_session(brain, "search");
    insert_entry(brain, &sid, "SQL injection in /login", "username param", Category::Vulnerability, 9, 0.9);
    insert_entry(brain, &sid, "Outdated jQuery", "version 1.8 has known XSS", Category::Finding, 6, 0.7);
    insert_entry(brain, &sid, "Admin panel exposed", "no auth on /admin", Category::Vulnerability, 8, 0.95);
    insert_entry(brain, &sid, "Check SQL error pages", "verbose errors leak queries", Category::Hypothesis, 4, 0.3);
    insert_entry(brain, &sid, "nmap scan", "ports 22, 80, 443", Category::Tool, 2, 0.8);
    sid
}

#[test]
fn results_are_ordered_by_priority_then_confidence() {
    let brain = test_brain();
    seed(&brain);
    let results = brain.search(&SearchRequest::default()).unwrap();
    assert_eq!(results.len(), 5);
    for pair in results.windows(2) {
        let (a, b) = (&pair[0].entry, &pair[1].entry);
        assert!(
            (a.priority, a.confidence, a.accessed_at) >= (b.priority, b.confidence, b.accessed_at),
            "{} before {}",
            a.title,
            b.title
        );
    }
}

#[test]
fn relevance_stays_in_unit_interval() {
    let brain = test_brain();
    seed(&brain);
    for query in ["", "sql", "SQL injection in /login", "zzz"] {
        for r in brain
            .search(&SearchRequest {
                query: query.into(),
                ..Default::default()
            })
            .unwrap()
        {
            assert!((0.0..=1.0).contains(&r.relevance), "{query}: {}", r.relevance);
        }
    }
}

#[test]
fn semantic_falls_back_to_substring_without_index() {
    let brain = test_brain_without_fts();
    assert_eq!(brain.capability(), SearchIndexCapability::None);
    seed(&brain);

    for query in ["sql", "ADMIN", "xss"] {
        let run = |search_type| {
            brain
                .search(&SearchRequest {
                    query: query.into(),
                    search_type: Some(search_type),
                    ..Default::default()
                })
                .unwrap()
                .into_iter()
                .map(|r| r.entry.id)
                .collect::<Vec<_>>()
        };
        let semantic = run(SearchType::Semantic);
        assert_eq!(semantic, run(SearchType::Exact), "query {query}");
        assert_eq!(semantic, run(SearchType::Fuzzy), "query {query}");
        assert!(!semantic.is_empty());
    }
}

#[test]
fn indexed_semantic_search_matches_words() {
    let brain = test_brain();
    seed(&brain);
    let results = brain
        .search(&SearchRequest {
            query: "verbose errors".into(),
            search_type: Some(SearchType::Semantic),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.title, "Check SQL error pages");
}

#[test]
fn category_filter_and_session_scope() {
    let brain = test_brain();
    let sid = seed(&brain);
    let other = create_session(&brain, "other");
    insert_entry(&brain, &other, "Other vuln", "c", Category::Vulnerability, 10, 1.0);

    let results = brain
        .search(&SearchRequest {
            session_id: Some(sid),
            categories: vec![Category::Vulnerability, Category::Hypothesis],
            ..Default::default()
        })
        .unwrap();
    let titles: Vec<_> = results.iter().map(|r| r.entry.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["SQL injection in /login", "Admin panel exposed", "Check SQL error pages"]
    );
}

#[test]
fn search_does_not_count_as_access() {
    let brain = test_brain();
    seed(&brain);
    for _ in 0..3 {
        brain.search(&SearchRequest::default()).unwrap();
    }
    for r in brain.search(&SearchRequest::default()).unwrap() {
        assert_eq!(r.entry.access_count, 0);
    }
}

#[test]
fn default_limit_applies_when_unset() {
    let brain = test_brain();
    let sid = create_session(&brain, "many");
    for i in 0..25 {
        insert_entry(&brain, &sid, &format!("entry {i}"), "c", Category::Note, 5, 0.5);
    }
    assert_eq!(brain.search(&SearchRequest::default()).unwrap().len(), 20);
    let all = brain
        .search(&SearchRequest {
            limit: Some(100),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(all.len(), 25);
}

#[test]
fn unknown_session_yields_no_results() {
    let brain = test_brain();
    seed(&brain);
    let results = brain
        .search(&SearchRequest {
            query: "sql".into(),
            session_id: Some("no-such-session".into()),
            search_type: Some(SearchType::Exact),
            ..Default::default()
        })
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(brain.database_stats().unwrap().search_history, 0);
}
