use anyhow::Result;

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::types::{SessionFilter, SessionStatus, TaskType};

/// List sessions, newest first.
pub fn sessions(
    config: &TinyBrainConfig,
    task_type: Option<TaskType>,
    status: Option<SessionStatus>,
    limit: usize,
) -> Result<()> {
    let brain = super::open(config)?;
    let sessions = brain.list_sessions(&SessionFilter {
        task_type,
        status,
        limit: Some(limit),
        offset: None,
    })?;

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!("{:<38} {:<24} {:<10} {}", "ID", "Task type", "Status", "Name");
    println!("{}", "-".repeat(90));
    for s in &sessions {
        println!(
            "{:<38} {:<24} {:<10} {}",
            s.id,
            s.task_type.as_str(),
            s.status.as_str(),
            super::preview(&s.name, 40)
        );
    }
    Ok(())
}
