//! CLI `inspect` and `related` commands: display one entry and its neighbors.

use anyhow::Result;

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::types::RelationshipType;

/// Inspect a single entry by ID. Does not count as an access.
pub fn inspect(config: &TinyBrainConfig, id: &str) -> Result<()> {
    let brain = super::open(config)?;
    let inspected = brain.inspect_entry(id)?;

    let e = &inspected.entry;
    println!("Entry: {}", e.id);
    println!("{}", "=".repeat(50));
    println!("  Title:          {}", e.title);
    println!(
        "  Session:        {} ({}, {})",
        inspected.session_name, inspected.session_task_type, inspected.session_status
    );
    println!("  Category:       {}", e.category);
    println!("  Content type:   {}", e.content_type);
    println!("  Priority:       {}", e.priority);
    println!("  Confidence:     {:.2}", e.confidence);
    if !e.tags.is_empty() {
        println!("  Tags:           {}", e.tags.join(", "));
    }
    if !e.source.is_empty() {
        println!("  Source:         {}", e.source);
    }
    println!("  Access count:   {}", e.access_count);
    println!("  Last accessed:  {}", e.accessed_at);
    println!("  Created:        {}", e.created_at);
    println!("  Updated:        {}", e.updated_at);
    println!();
    println!("Content:");
    println!("  {}", e.content);

    if !inspected.relationships.is_empty() {
        println!();
        println!("Relationships:");
        for edge in &inspected.relationships {
            let rel = &edge.relationship;
            println!(
                "  {} --[{} {:.2}]--> {}",
                super::preview(&edge.source_title, 30),
                rel.relationship_type,
                rel.strength,
                super::preview(&edge.target_title, 30),
            );
        }
    }

    Ok(())
}

/// List entries linked to `id` in either direction.
pub fn related(
    config: &TinyBrainConfig,
    id: &str,
    relationship_type: Option<RelationshipType>,
    limit: Option<usize>,
) -> Result<()> {
    let brain = super::open(config)?;
    let related = brain.get_related_entries(id, relationship_type, limit)?;

    if related.is_empty() {
        println!("No related entries.");
        return Ok(());
    }

    for (i, e) in related.iter().enumerate() {
        println!(
            "  {}. [{}] {} (priority: {}) {}",
            i + 1,
            e.category,
            super::preview(&e.title, 60),
            e.priority,
            e.id
        );
    }
    Ok(())
}
