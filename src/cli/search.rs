use anyhow::Result;

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::types::SearchRequest;

/// Run a search from the terminal.
pub fn search(config: &TinyBrainConfig, request: SearchRequest) -> Result<()> {
    let brain = super::open(config)?;
    let results = brain.search(&request)?;

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", results.len());

    for (i, result) in results.iter().enumerate() {
        let e = &result.entry;
        println!(
            "  {}. [{}] {} (priority: {}, confidence: {:.2}, relevance: {:.3})",
            i + 1,
            e.category,
            e.title,
            e.priority,
            e.confidence,
            result.relevance,
        );
        println!("     id: {}", e.id);
        println!("     {}", super::preview(&e.content, 120));
        println!();
    }

    Ok(())
}
