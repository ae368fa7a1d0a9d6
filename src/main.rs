mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tinybrain::config::TinyBrainConfig;
use tinybrain::memory::types::{Category, RelationshipType, SearchType, SessionStatus, TaskType};

#[derive(Parser)]
#[command(name = "tinybrain", version, about = "Security-assessment working memory")]
struct Cli {
    /// Config file (defaults to ~/.tinybrain/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding config and TINYBRAIN_DB
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and schema if missing
    Init,
    /// Run database diagnostics
    Doctor,
    /// Show database and memory statistics
    Stats,
    /// List sessions
    Sessions {
        #[arg(long)]
        task_type: Option<TaskType>,
        #[arg(long)]
        status: Option<SessionStatus>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Search memory entries
    Search {
        query: String,
        #[arg(long)]
        session: Option<String>,
        #[arg(long = "type", default_value = "exact")]
        search_type: SearchType,
        #[arg(long = "category")]
        categories: Vec<Category>,
        #[arg(long)]
        min_priority: Option<i32>,
        #[arg(long)]
        min_confidence: Option<f64>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one entry with its session and relationships (not counted as an access)
    Inspect { id: String },
    /// List entries related to an entry
    Related {
        id: String,
        #[arg(long = "type")]
        relationship_type: Option<RelationshipType>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Create a context snapshot for a session and print its summary
    Snapshot {
        session_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// JSON object stored verbatim
        #[arg(long)]
        context: Option<String>,
    },
    /// Export a session as JSON
    Export {
        session_id: String,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List built-in finding templates
    Templates,
    /// Store an entry from a template
    FromTemplate {
        session_id: String,
        name: String,
        /// Placeholder value, e.g. --set component=/login
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Import an exported session as a new session
    Import { file: PathBuf },
    /// Delete old, low-priority, or unused entries
    Cleanup {
        #[command(subcommand)]
        mode: CleanupMode,
        /// Report candidates without deleting
        #[arg(long, global = true)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum CleanupMode {
    /// Entries created more than N days ago
    Old {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Entries at or below both priority and confidence ceilings
    LowPriority {
        #[arg(long)]
        max_priority: Option<i32>,
        #[arg(long)]
        max_confidence: Option<f64>,
    },
    /// Entries not read for N days and read fewer than M times
    Unused {
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        max_access_count: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TinyBrainConfig::load_from(path)?,
        None => TinyBrainConfig::load()?,
    };
    if let Some(db) = &cli.db {
        config.storage.db_path = db.to_string_lossy().into_owned();
    }

    // Log to stderr so stdout stays clean for JSON output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Init => cli::init(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Sessions {
            task_type,
            status,
            limit,
        } => cli::sessions::sessions(&config, task_type, status, limit)?,
        Command::Search {
            query,
            session,
            search_type,
            categories,
            min_priority,
            min_confidence,
            limit,
        } => cli::search::search(
            &config,
            tinybrain::memory::types::SearchRequest {
                query,
                session_id: session,
                search_type: Some(search_type),
                categories,
                min_priority,
                min_confidence,
                limit,
                offset: None,
            },
        )?,
        Command::Inspect { id } => cli::inspect::inspect(&config, &id)?,
        Command::Related {
            id,
            relationship_type,
            limit,
        } => cli::inspect::related(&config, &id, relationship_type, limit)?,
        Command::Snapshot {
            session_id,
            name,
            description,
            context,
        } => cli::snapshot::snapshot(&config, session_id, name, description, context.as_deref())?,
        Command::Export { session_id, output } => {
            cli::export::export(&config, &session_id, output.as_deref())?
        }
        Command::Templates => cli::templates::list()?,
        Command::FromTemplate {
            session_id,
            name,
            set,
        } => cli::templates::apply(&config, &session_id, &name, &set)?,
        Command::Import { file } => cli::import::import(&config, &file)?,
        Command::Cleanup { mode, dry_run } => match mode {
            CleanupMode::Old { days } => cli::maintenance::cleanup_old(&config, days, dry_run)?,
            CleanupMode::LowPriority {
                max_priority,
                max_confidence,
            } => cli::maintenance::cleanup_low_priority(
                &config,
                max_priority,
                max_confidence,
                dry_run,
            )?,
            CleanupMode::Unused {
                days,
                max_access_count,
            } => cli::maintenance::cleanup_unused(&config, days, max_access_count, dry_run)?,
        },
    }

    Ok(())
}
