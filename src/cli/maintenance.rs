//! CLI `cleanup` commands: delete old, low-priority, or unused entries.

use anyhow::Result;

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::maintenance::CleanupResult;

pub fn cleanup_old(config: &TinyBrainConfig, days: Option<u32>, dry_run: bool) -> Result<()> {
    let brain = super::open(config)?;
    report(&brain.cleanup_old(days, dry_run)?, "old")
}

pub fn cleanup_low_priority(
    config: &TinyBrainConfig,
    max_priority: Option<i32>,
    max_confidence: Option<f64>,
    dry_run: bool,
) -> Result<()> {
    let brain = super::open(config)?;
    report(
        &brain.cleanup_low_priority(max_priority, max_confidence, dry_run)?,
        "low-priority",
    )
}

pub fn cleanup_unused(
    config: &TinyBrainConfig,
    days: Option<u32>,
    max_access_count: Option<u32>,
    dry_run: bool,
) -> Result<()> {
    let brain = super::open(config)?;
    report(&brain.cleanup_unused(days, max_access_count, dry_run)?, "unused")
}

fn report(result: &CleanupResult, kind: &str) -> Result<()> {
    if result.candidates.is_empty() {
        println!("No {kind} entries found.");
        return Ok(());
    }

    if result.dry_run {
        println!(
            "Found {} {kind} candidate(s) (dry run, nothing deleted):\n",
            result.candidates.len()
        );
        println!(
            "{:<38} {:<8} {:<10} {:<8} {}",
            "ID", "Priority", "Confidence", "Reads", "Title"
        );
        println!("{}", "-".repeat(100));
        for c in &result.candidates {
            println!(
                "{:<38} {:<8} {:<10.2} {:<8} {}",
                c.id,
                c.priority,
                c.confidence,
                c.access_count,
                super::preview(&c.title, 40)
            );
        }
    } else {
        println!("Deleted {} {kind} entries.", result.deleted);
    }

    Ok(())
}
