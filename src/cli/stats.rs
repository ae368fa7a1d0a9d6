use anyhow::Result;

use tinybrain::config::TinyBrainConfig;

use super::doctor::format_bytes;

/// Display database and memory statistics in the terminal.
pub fn stats(config: &TinyBrainConfig) -> Result<()> {
    let brain = super::open(config)?;
    let db = brain.database_stats()?;
    let mem = brain.memory_stats()?;

    println!("Database Statistics");
    println!("{}", "=".repeat(40));
    println!("  Sessions:            {}", db.sessions);
    println!("  Memory entries:      {}", db.memory_entries);
    println!("  Relationships:       {}", db.relationships);
    println!("  Context snapshots:   {}", db.context_snapshots);
    println!("  Search history:      {}", db.search_history);
    println!("  Task progress:       {}", db.task_progress);
    println!("  Database size:       {}", format_bytes(db.db_size_bytes));
    println!();

    println!("By Priority:");
    println!("  high (8-10)          {}", mem.high_priority);
    println!("  medium (5-7)         {}", mem.medium_priority);
    println!("  low (0-4)            {}", mem.low_priority);
    println!();

    println!("Created:");
    println!("  last 7 days          {}", mem.created_last_7_days);
    println!("  last 30 days         {}", mem.created_last_30_days);
    println!("  last 90 days         {}", mem.created_last_90_days);
    println!();

    println!("Unused entries:        {}", mem.unused);
    println!("Average access count:  {:.2}", mem.average_access_count);

    if !db.top_accessed.is_empty() {
        println!();
        println!("Most accessed:");
        for e in &db.top_accessed {
            println!("  {:>5}  {}  {}", e.access_count, e.id, super::preview(&e.title, 60));
        }
    }

    Ok(())
}
