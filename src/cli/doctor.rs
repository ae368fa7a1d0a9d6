//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use tinybrain::config::TinyBrainConfig;
use tinybrain::db::health::check_database_health;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &TinyBrainConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `tinybrain init` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let brain = super::open(config).context("failed to open database (may be corrupt)")?;
    let report = brain
        .database()
        .with_conn(|c| Ok(check_database_health(c)?))
        .context("failed to run health check")?;

    println!("tinybrain Health Report");
    println!("=======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("SQLite:            {}", report.sqlite_version);
    println!("Journal mode:      {}", report.journal_mode);
    println!("Foreign keys:      {}", if report.foreign_keys { "on" } else { "OFF" });
    println!("Full-text index:   {:?}", report.search_index);
    if !report.search_index_in_sync {
        println!("  WARNING: full-text index is out of sync with memory entries.");
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }
    if report.foreign_key_violations > 0 {
        println!("Foreign key check: {} violation(s)", report.foreign_key_violations);
    }

    if !report.integrity_ok {
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.tinybrain/memory.db");
        println!("  2. Or export sessions from a good copy and reimport:");
        println!("     tinybrain export <session-id> -o session.json");
        println!("     tinybrain --db fresh.db import session.json");
    }

    Ok(())
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
