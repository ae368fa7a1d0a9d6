use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TinyBrainConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// Create the FTS5 index when opening a fresh database.
    pub full_text_search: bool,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
    pub related_limit: usize,
    pub similar_limit: usize,
    /// Entries included in a snapshot summary.
    pub summary_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub max_age_days: u32,
    pub unused_days: u32,
    pub unused_max_access_count: u32,
    pub low_priority_max: i32,
    pub low_confidence_max: f64,
    pub batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_tinybrain_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            full_text_search: true,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            related_limit: 10,
            similar_limit: 10,
            summary_limit: 10,
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            max_age_days: 90,
            unused_days: 30,
            unused_max_access_count: 5,
            low_priority_max: 2,
            low_confidence_max: 0.3,
            batch_size: 100,
        }
    }
}

/// Returns `~/.tinybrain/`, or `./.tinybrain/` when no home directory is known.
pub fn default_tinybrain_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tinybrain")
}

/// Returns the default config file path: `~/.tinybrain/config.toml`
pub fn default_config_path() -> PathBuf {
    default_tinybrain_dir().join("config.toml")
}

impl TinyBrainConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TinyBrainConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (TINYBRAIN_DB, TINYBRAIN_LOG_LEVEL, TINYBRAIN_FTS).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TINYBRAIN_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("TINYBRAIN_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("TINYBRAIN_FTS") {
            self.storage.full_text_search = parse_flag(&val);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

fn parse_flag(val: &str) -> bool {
    !matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
