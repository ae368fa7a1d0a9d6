use anyhow::{Context, Result};
use std::path::Path;

use tinybrain::config::TinyBrainConfig;

/// Export one session as JSON to stdout or a file.
pub fn export(config: &TinyBrainConfig, session_id: &str, output: Option<&Path>) -> Result<()> {
    let brain = super::open(config)?;
    let export = brain.export_session(session_id)?;
    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => std::fs::write(path, &json)
            .with_context(|| format!("failed to write export to {}", path.display()))?,
        None => println!("{json}"),
    }

    eprintln!(
        "Exported session {} with {} entries, {} relationships, {} snapshots, {} tasks.",
        export.session.id,
        export.memory_entries.len(),
        export.relationships.len(),
        export.snapshots.len(),
        export.tasks.len()
    );

    Ok(())
}
