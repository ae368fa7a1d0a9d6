use anyhow::{Context, Result};

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::types::CreateSnapshotRequest;

/// Create a context snapshot and print the generated summary.
pub fn snapshot(
    config: &TinyBrainConfig,
    session_id: String,
    name: String,
    description: String,
    context: Option<&str>,
) -> Result<()> {
    let context_data = match context {
        Some(raw) => serde_json::from_str(raw).context("--context must be valid JSON")?,
        None => serde_json::json!({}),
    };

    let brain = super::open(config)?;
    let snapshot = brain.create_snapshot(&CreateSnapshotRequest {
        session_id,
        name,
        description,
        context_data,
    })?;

    println!("Snapshot {} created.\n", snapshot.id);
    println!("{}", snapshot.memory_summary);
    Ok(())
}
