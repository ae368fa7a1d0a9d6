//! Core type definitions.
//!
//! Enumerations mirror the CHECK constraints in the schema one-for-one. Each
//! enum converts to and from its SQL text form via [`rusqlite::types::ToSql`] /
//! [`rusqlite::types::FromSql`], so an unknown stored value surfaces as a
//! serialization error rather than a panic.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Declares a string-backed enum with `as_str`, `Display`, `FromStr`, and SQL
/// conversions. Variant strings must match the schema CHECK lists exactly.
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// SQL-compatible string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(format!(concat!("unknown ", $label, ": {}"), s)),
                }
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
            }
        }
    };
}

sql_enum! {
    /// Kind of assessment a session tracks.
    TaskType ("task type") {
        SecurityReview => "security_review",
        PenetrationTest => "penetration_test",
        ExploitDev => "exploit_dev",
        VulnerabilityAnalysis => "vulnerability_analysis",
        ThreatModeling => "threat_modeling",
        IncidentResponse => "incident_response",
        General => "general",
    }
}

sql_enum! {
    /// Lifecycle state of a session.
    SessionStatus ("session status") {
        Active => "active",
        Paused => "paused",
        Completed => "completed",
        Archived => "archived",
    }
}

sql_enum! {
    /// Format of a memory entry's `content`.
    ContentType ("content type") {
        Text => "text",
        Code => "code",
        Json => "json",
        Yaml => "yaml",
        Markdown => "markdown",
        BinaryRef => "binary_ref",
    }
}

sql_enum! {
    /// What kind of knowledge a memory entry records.
    Category ("category") {
        Finding => "finding",
        Vulnerability => "vulnerability",
        Exploit => "exploit",
        Payload => "payload",
        Technique => "technique",
        Tool => "tool",
        Reference => "reference",
        Context => "context",
        Hypothesis => "hypothesis",
        Evidence => "evidence",
        Recommendation => "recommendation",
        Note => "note",
    }
}

sql_enum! {
    /// Label on a directed edge between two memory entries.
    RelationshipType ("relationship type") {
        DependsOn => "depends_on",
        Causes => "causes",
        Mitigates => "mitigates",
        Exploits => "exploits",
        References => "references",
        Contradicts => "contradicts",
        Supports => "supports",
        RelatedTo => "related_to",
        ParentOf => "parent_of",
        ChildOf => "child_of",
    }
}

sql_enum! {
    /// Text-matching strategy for a search.
    SearchType ("search type") {
        /// Full-text index match, substring fallback when no index exists.
        Semantic => "semantic",
        /// Same dispatch as `Semantic`.
        Fuzzy => "fuzzy",
        /// Case-insensitive substring over title, content, and tags.
        Exact => "exact",
        /// Case-insensitive substring over tags only.
        Tag => "tag",
    }
}

sql_enum! {
    /// State of a tracked multi-stage task.
    TaskStatus ("task status") {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        Blocked => "blocked",
    }
}

/// Whether the optional FTS5 index over memory entries exists.
///
/// Probed once when the database is opened; semantic and fuzzy searches fall
/// back to substring matching when it is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIndexCapability {
    None,
    Indexed,
}

/// An assessment session, matching the `sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub description: String,
    pub task_type: TaskType,
    pub status: SessionStatus,
    /// Arbitrary JSON object; `{}` when none was supplied.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single finding, matching the `memory_entries` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// UUID v7 primary key.
    pub id: String,
    pub session_id: String,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub category: Category,
    /// 0 (informational) to 10 (critical).
    pub priority: i32,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub tags: Vec<String>,
    /// Free-text provenance (tool name, URL, analyst).
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last time this entry was read through `get_entry`.
    pub accessed_at: DateTime<Utc>,
    pub access_count: u32,
}

/// A directed, typed edge between two memory entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source_entry_id: String,
    pub target_entry_id: String,
    pub relationship_type: RelationshipType,
    /// Edge weight in `[0.0, 1.0]`.
    pub strength: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A named point-in-time capture of caller context plus a findings summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub description: String,
    /// Stored verbatim.
    pub context_data: serde_json::Value,
    pub memory_summary: String,
    pub created_at: DateTime<Utc>,
}

/// Progress on a multi-stage task within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    pub id: String,
    pub session_id: String,
    pub task_name: String,
    pub stage: String,
    pub status: TaskStatus,
    /// 0 to 100.
    pub progress_percentage: i32,
    pub notes: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateSessionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub task_type: TaskType,
    /// JSON object; `{}` when absent.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionFilter {
    #[serde(default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Input for storing a memory entry. Zero priority/confidence and an empty
/// content type are treated as "not provided" and defaulted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateEntryRequest {
    pub session_id: String,
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[schemars(with = "Option<ContentType>")]
    pub content_type: Option<ContentType>,
    pub category: Category,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: String,
}

impl CreateEntryRequest {
    /// Minimal request with every optional field left for defaulting.
    pub fn new(
        session_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            title: title.into(),
            content: content.into(),
            content_type: None,
            category,
            priority: 0,
            confidence: 0.0,
            tags: Vec::new(),
            source: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[schemars(with = "Option<ContentType>")]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub source: Option<String>,
}

/// One element of a batch update: the target id plus its patch fields.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntryUpdate {
    pub id: String,
    #[serde(flatten)]
    pub patch: UpdateEntryRequest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EntryFilter {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Entry category must be one of these; empty means any.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Entry must carry every listed tag.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[schemars(with = "Option<SearchType>")]
    pub search_type: Option<SearchType>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub min_priority: Option<i32>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateRelationshipRequest {
    pub source_entry_id: String,
    pub target_entry_id: String,
    pub relationship_type: RelationshipType,
    /// Defaults to 0.5.
    #[serde(default)]
    pub strength: Option<f64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateSnapshotRequest {
    pub session_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object")]
    pub context_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskRequest {
    pub session_id: String,
    pub task_name: String,
    pub stage: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub progress_percentage: i32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub progress_percentage: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Deserialize an optional enum where an empty string means "not provided".
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr<Err = String>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
