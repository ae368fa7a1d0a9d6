pub mod doctor;
pub mod export;
pub mod import;
pub mod inspect;
pub mod maintenance;
pub mod search;
pub mod sessions;
pub mod snapshot;
pub mod stats;
pub mod templates;

use anyhow::Result;

use tinybrain::config::TinyBrainConfig;
use tinybrain::TinyBrain;

/// Open the configured database, creating it if needed.
pub fn open(config: &TinyBrainConfig) -> Result<TinyBrain> {
    TinyBrain::open(config)
}

/// Create the database file and schema, then report where it lives.
pub fn init(config: &TinyBrainConfig) -> Result<()> {
    let brain = open(config)?;
    println!("Database ready at {}", config.resolved_db_path().display());
    println!("Full-text index: {:?}", brain.capability());
    Ok(())
}

/// Character-safe preview for terminal output.
pub fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > max_chars {
        let head: String = single_line.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        single_line
    }
}
