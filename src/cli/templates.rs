use std::collections::HashMap;

use anyhow::{bail, Result};

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::templates::TEMPLATES;

/// Print the built-in finding templates.
pub fn list() -> Result<()> {
    println!("{:<24} {:<14} {:<8} {}", "Name", "Group", "Priority", "Title");
    println!("{}", "-".repeat(80));
    for t in TEMPLATES {
        println!("{:<24} {:<14} {:<8} {}", t.name, t.group, t.priority, t.title);
    }
    Ok(())
}

/// Store an entry from a template, filling `KEY=VALUE` placeholders.
pub fn apply(config: &TinyBrainConfig, session_id: &str, name: &str, set: &[String]) -> Result<()> {
    let mut replacements = HashMap::new();
    for pair in set {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE, got {pair:?}");
        };
        replacements.insert(key.trim().to_string(), value.to_string());
    }

    let brain = super::open(config)?;
    let entry = brain.create_entry_from_template(session_id, name, &replacements)?;
    println!("Stored {} ({})", entry.id, entry.title);
    println!("  {}", super::preview(&entry.content, 120));
    Ok(())
}
