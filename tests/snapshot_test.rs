mod helpers;

use helpers::{create_session, insert_entry, test_brain};
use tinybrain::memory::types::{Category, CreateSnapshotRequest};

fn snapshot(brain: &tinybrain::TinyBrain, sid: &str) -> tinybrain::memory::types::ContextSnapshot {
    brain
        .create_snapshot(&CreateSnapshotRequest {
            session_id: sid.into(),
            name: "checkpoint".into(),
            description: "after recon".into(),
            context_data: serde_json::json!({"phase": "recon"}),
        })
        .unwrap()
}

#[test]
fn empty_session_has_placeholder_summary() {
    let brain = test_brain();
    let sid = create_session(&brain, "empty");
    let snap = snapshot(&brain, &sid);
    assert_eq!(
        snap.memory_summary,
        "Recent High-Priority Findings:\nNo high-priority findings yet."
    );
    assert_eq!(snap.context_data["phase"], "recon");
}

#[test]
fn summary_lists_entries_with_truncated_excerpts() {
    let brain = test_brain();
    let sid = create_session(&brain, "populated");
    let long = "A".repeat(150);
    let short = "b".repeat(40);
    insert_entry(&brain, &sid, "High Priority Finding", &long, Category::Vulnerability, 9, 0.9);
    insert_entry(&brain, &sid, "Medium Priority Finding", &short, Category::Finding, 5, 0.7);

    let snap = snapshot(&brain, &sid);
    let expected = format!(
        "Recent High-Priority Findings:\n\
         1. [vulnerability] High Priority Finding (Priority: 9, Confidence: 0.9)\n   {}...\n\
         2. [finding] Medium Priority Finding (Priority: 5, Confidence: 0.7)\n   {}\n",
        "A".repeat(100),
        short
    );
    assert_eq!(snap.memory_summary, expected);

    let stored = brain.get_snapshot(&snap.id).unwrap();
    assert_eq!(stored.memory_summary, expected);
}

#[test]
fn summary_is_capped_at_ten_entries() {
    let brain = test_brain();
    let sid = create_session(&brain, "many");
    for i in 0..12 {
        insert_entry(&brain, &sid, &format!("e{i}"), "c", Category::Finding, 1 + i % 10, 0.5);
    }
    let snap = snapshot(&brain, &sid);
    assert!(snap.memory_summary.contains("\n10. "));
    assert!(!snap.memory_summary.contains("\n11. "));
}

#[test]
fn summary_failure_still_stores_snapshot() {
    let brain = test_brain();
    let sid = create_session(&brain, "broken");
    brain
        .database()
        .with_conn(|c| {
            c.execute_batch(
                "DROP VIEW relationship_network;
                 DROP VIEW memory_entries_with_session;
                 DROP TABLE relationships;
                 DROP TABLE memory_entries_fts;
                 DROP TABLE memory_entries;",
            )?;
            Ok(())
        })
        .unwrap();

    let snap = snapshot(&brain, &sid);
    assert_eq!(snap.memory_summary, "Failed to generate summary");
    assert_eq!(brain.get_snapshot(&snap.id).unwrap().name, "checkpoint");
}

#[test]
fn snapshots_list_newest_first() {
    let brain = test_brain();
    let sid = create_session(&brain, "list");
    let first = snapshot(&brain, &sid);
    let second = snapshot(&brain, &sid);
    let listed = brain.list_snapshots(&sid, None, None).unwrap();
    let ids: Vec<_> = listed.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
}

#[test]
fn snapshot_for_unknown_session_is_rejected() {
    let brain = test_brain();
    let err = brain
        .create_snapshot(&CreateSnapshotRequest {
            session_id: "missing".into(),
            name: "x".into(),
            description: String::new(),
            context_data: serde_json::json!({}),
        })
        .unwrap_err();
    assert!(err.is_constraint_violation());
}
