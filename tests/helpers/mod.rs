#![allow(dead_code)]

use tinybrain::memory::types::{
    Category, CreateEntryRequest, CreateRelationshipRequest, CreateSessionRequest,
    MemoryEntry, Relationship, RelationshipType, TaskType,
};
use tinybrain::TinyBrain;

/// Open a fresh in-memory engine with the full-text index.
pub fn test_brain() -> TinyBrain {
    TinyBrain::in_memory(true).unwrap()
}

/// Open a fresh in-memory engine without the full-text index.
pub fn test_brain_without_fts() -> TinyBrain {
    TinyBrain::in_memory(false).unwrap()
}

/// Create a session and return its id.
pub fn create_session(brain: &TinyBrain, name: &str) -> String {
    brain
        .create_session(&CreateSessionRequest {
            name: name.into(),
            description: String::new(),
            task_type: TaskType::PenetrationTest,
            metadata: None,
        })
        .unwrap()
        .id
}

/// Store an entry with explicit priority and confidence.
pub fn insert_entry(
    brain: &TinyBrain,
    session_id: &str,
    title: &str,
    content: &str,
    category: Category,
    priority: i32,
    confidence: f64,
) -> MemoryEntry {
    let mut req = CreateEntryRequest::new(session_id, title, content, category);
    req.priority = priority;
    req.confidence = confidence;
    brain.create_entry(&req).unwrap()
}

/// Link two entries with default strength.
pub fn link(
    brain: &TinyBrain,
    source: &str,
    target: &str,
    relationship_type: RelationshipType,
) -> tinybrain::Result<Relationship> {
    brain.create_relationship(&CreateRelationshipRequest {
        source_entry_id: source.into(),
        target_entry_id: target.into(),
        relationship_type,
        strength: None,
        description: String::new(),
    })
}
