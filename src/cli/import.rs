use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::transfer::SessionExport;

/// Import an exported session as a new session.
///
/// Every entry, relationship, and task is written in one transaction: either the
/// whole session lands or nothing does.
pub fn import(config: &TinyBrainConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let data: SessionExport = serde_json::from_str(&json).context("failed to parse import JSON")?;

    let brain = super::open(config)?;

    println!(
        "Importing session \"{}\": {} entries, {} relationships, {} tasks...",
        data.session.name,
        data.memory_entries.len(),
        data.relationships.len(),
        data.tasks.len()
    );

    let pb = ProgressBar::new(data.item_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .context("invalid progress template")?
            .progress_chars("##-"),
    );

    let summary = brain.import_session(&data, || pb.inc(1));
    pb.finish_and_clear();
    let summary = summary?;

    println!("Import complete:");
    println!("  New session id:      {}", summary.session_id);
    println!("  Entries imported:    {}", summary.entries);
    println!("  Relationships:       {}", summary.relationships);
    if summary.relationships_skipped > 0 {
        println!("  Relationships skipped: {} (endpoint not in export)", summary.relationships_skipped);
    }
    println!("  Tasks imported:      {}", summary.tasks);

    Ok(())
}
