//! The memory store engine: one [`Database`] plus retrieval and maintenance
//! settings, exposing every core operation as a blocking method.
//!
//! Reads and single-row writes run in autocommit mode; multi-row writes
//! (batch create, import, cleanup batches) run in a transaction.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::config::{MaintenanceConfig, RetrievalConfig, TinyBrainConfig};
use crate::db::Database;
use crate::error::Result;
use crate::memory::maintenance::{self, CleanupResult};
use crate::memory::relations::{self, NetworkEdge};
use crate::memory::search::{self, SearchResult};
use crate::memory::stats::{self, DatabaseStats, MemoryStats};
use crate::memory::store::{self, InspectedEntry};
use crate::memory::transfer::{self, ImportSummary, SessionExport};
use crate::memory::types::*;
use crate::memory::{sessions, snapshots, tasks, templates};

#[derive(Debug)]
pub struct TinyBrain {
    db: Database,
    retrieval: RetrievalConfig,
    maintenance: MaintenanceConfig,
}

impl TinyBrain {
    /// Open the configured database file.
    pub fn open(config: &TinyBrainConfig) -> anyhow::Result<Self> {
        let path = config.resolved_db_path();
        Self::open_at(&path, config)
    }

    pub fn open_at(path: &Path, config: &TinyBrainConfig) -> anyhow::Result<Self> {
        let db = Database::open(path, &config.storage)
            .with_context(|| format!("failed to open tinybrain database at {}", path.display()))?;
        Ok(Self::with_database(db, config))
    }

    /// In-memory engine with default settings.
    pub fn in_memory(full_text_search: bool) -> anyhow::Result<Self> {
        let db = Database::open_in_memory(full_text_search)?;
        Ok(Self::with_database(db, &TinyBrainConfig::default()))
    }

    pub fn with_database(db: Database, config: &TinyBrainConfig) -> Self {
        Self {
            db,
            retrieval: config.retrieval.clone(),
            maintenance: config.maintenance.clone(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn capability(&self) -> SearchIndexCapability {
        self.db.capability()
    }

    // ── Sessions ────────────────────────────────────────────────────────────

    pub fn create_session(&self, req: &CreateSessionRequest) -> Result<Session> {
        self.db.with_conn(|c| sessions::create_session(c, req))
    }

    pub fn get_session(&self, id: &str) -> Result<Session> {
        self.db.with_conn(|c| sessions::get_session(c, id))
    }

    pub fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        self.db.with_conn(|c| sessions::list_sessions(c, filter))
    }

    pub fn update_session(&self, id: &str, patch: &UpdateSessionRequest) -> Result<Session> {
        self.db.with_conn(|c| sessions::update_session(c, id, patch))
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        self.db.with_conn(|c| sessions::delete_session(c, id))
    }

    // ── Entries ─────────────────────────────────────────────────────────────

    pub fn create_entry(&self, req: &CreateEntryRequest) -> Result<MemoryEntry> {
        self.db.with_conn(|c| store::create_entry(c, req))
    }

    /// All-or-nothing insert of several entries into one session.
    pub fn batch_create_entries(
        &self,
        session_id: &str,
        requests: &[CreateEntryRequest],
    ) -> Result<Vec<MemoryEntry>> {
        self.db
            .run_in_transaction(|c| store::batch_create_entries(c, session_id, requests))
    }

    /// Fetch an entry and record the access.
    pub fn get_entry(&self, id: &str) -> Result<MemoryEntry> {
        self.db.with_conn(|c| store::get_entry(c, id))
    }

    pub fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<MemoryEntry>> {
        let mut filter = filter.clone();
        filter.limit = filter.limit.or(Some(self.retrieval.default_limit));
        self.db.with_conn(|c| store::list_entries(c, &filter))
    }

    pub fn update_entry(&self, id: &str, patch: &UpdateEntryRequest) -> Result<MemoryEntry> {
        self.db.with_conn(|c| store::update_entry(c, id, patch))
    }

    pub fn delete_entry(&self, id: &str) -> Result<()> {
        self.db.with_conn(|c| store::delete_entry(c, id))
    }

    /// Entry with session details and relationship network. Not an access.
    pub fn inspect_entry(&self, id: &str) -> Result<InspectedEntry> {
        self.db.with_conn(|c| store::inspect_entry(c, id))
    }

    /// Apply several partial updates, all or nothing.
    pub fn batch_update_entries(&self, updates: &[EntryUpdate]) -> Result<Vec<MemoryEntry>> {
        self.db
            .run_in_transaction(|c| store::batch_update_entries(c, updates))
    }

    /// Delete the listed entries in one transaction; returns how many existed.
    pub fn batch_delete_entries(&self, ids: &[String]) -> Result<usize> {
        self.db
            .run_in_transaction(|c| store::batch_delete_entries(c, ids))
    }

    pub fn find_similar_entries(
        &self,
        session_id: &str,
        text: &str,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryEntry>> {
        let limit = limit.unwrap_or(self.retrieval.similar_limit);
        self.db
            .with_conn(|c| store::find_similar_entries(c, session_id, text, limit))
    }

    pub fn check_duplicates(
        &self,
        session_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Vec<MemoryEntry>> {
        self.db
            .with_conn(|c| store::check_duplicates(c, session_id, title, content))
    }

    pub fn create_entry_from_template(
        &self,
        session_id: &str,
        template_name: &str,
        replacements: &HashMap<String, String>,
    ) -> Result<MemoryEntry> {
        self.db.with_conn(|c| {
            templates::create_entry_from_template(c, session_id, template_name, replacements)
        })
    }

    // ── Search ──────────────────────────────────────────────────────────────

    pub fn search(&self, req: &SearchRequest) -> Result<Vec<SearchResult>> {
        let mut req = req.clone();
        req.limit = req.limit.or(Some(self.retrieval.default_limit));
        let capability = self.db.capability();
        self.db.with_conn(|c| search::search(c, capability, &req))
    }

    // ── Relationships ───────────────────────────────────────────────────────

    pub fn create_relationship(&self, req: &CreateRelationshipRequest) -> Result<Relationship> {
        self.db.with_conn(|c| relations::create_relationship(c, req))
    }

    pub fn get_relationship(&self, id: &str) -> Result<Relationship> {
        self.db.with_conn(|c| relations::get_relationship(c, id))
    }

    pub fn delete_relationship(&self, id: &str) -> Result<()> {
        self.db.with_conn(|c| relations::delete_relationship(c, id))
    }

    pub fn list_relationships(&self, entry_id: &str) -> Result<Vec<Relationship>> {
        self.db.with_conn(|c| relations::list_relationships(c, entry_id))
    }

    /// Entries linked to `entry_id` in either direction. `limit` defaults to
    /// the configured related limit.
    pub fn get_related_entries(
        &self,
        entry_id: &str,
        relationship_type: Option<RelationshipType>,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryEntry>> {
        let limit = limit.unwrap_or(self.retrieval.related_limit);
        self.db
            .with_conn(|c| relations::get_related_entries(c, entry_id, relationship_type, limit))
    }

    pub fn relationship_network(&self, session_id: Option<&str>) -> Result<Vec<NetworkEdge>> {
        self.db
            .with_conn(|c| relations::relationship_network(c, session_id))
    }

    // ── Snapshots ───────────────────────────────────────────────────────────

    pub fn create_snapshot(&self, req: &CreateSnapshotRequest) -> Result<ContextSnapshot> {
        let limit = self.retrieval.summary_limit;
        self.db
            .with_conn(|c| snapshots::create_snapshot(c, req, limit))
    }

    pub fn get_snapshot(&self, id: &str) -> Result<ContextSnapshot> {
        self.db.with_conn(|c| snapshots::get_snapshot(c, id))
    }

    pub fn list_snapshots(
        &self,
        session_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<ContextSnapshot>> {
        self.db
            .with_conn(|c| snapshots::list_snapshots(c, session_id, limit, offset))
    }

    // ── Tasks ───────────────────────────────────────────────────────────────

    pub fn create_task(&self, req: &CreateTaskRequest) -> Result<TaskProgress> {
        self.db.with_conn(|c| tasks::create_task(c, req))
    }

    pub fn update_task(&self, id: &str, patch: &UpdateTaskRequest) -> Result<TaskProgress> {
        self.db.with_conn(|c| tasks::update_task(c, id, patch))
    }

    pub fn get_task(&self, id: &str) -> Result<TaskProgress> {
        self.db.with_conn(|c| tasks::get_task(c, id))
    }

    pub fn list_tasks(
        &self,
        session_id: &str,
        status: Option<TaskStatus>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<TaskProgress>> {
        self.db
            .with_conn(|c| tasks::list_tasks(c, session_id, status, limit, offset))
    }

    // ── Statistics ──────────────────────────────────────────────────────────

    pub fn database_stats(&self) -> Result<DatabaseStats> {
        self.db.with_conn(stats::database_stats)
    }

    pub fn memory_stats(&self) -> Result<MemoryStats> {
        self.db.with_conn(stats::memory_stats)
    }

    // ── Cleanup ─────────────────────────────────────────────────────────────

    pub fn cleanup_old(&self, max_age_days: Option<u32>, dry_run: bool) -> Result<CleanupResult> {
        maintenance::cleanup_old(
            &self.db,
            max_age_days.unwrap_or(self.maintenance.max_age_days),
            self.maintenance.batch_size,
            dry_run,
        )
    }

    pub fn cleanup_low_priority(
        &self,
        max_priority: Option<i32>,
        max_confidence: Option<f64>,
        dry_run: bool,
    ) -> Result<CleanupResult> {
        maintenance::cleanup_low_priority(
            &self.db,
            max_priority.unwrap_or(self.maintenance.low_priority_max),
            max_confidence.unwrap_or(self.maintenance.low_confidence_max),
            self.maintenance.batch_size,
            dry_run,
        )
    }

    pub fn cleanup_unused(
        &self,
        max_unused_days: Option<u32>,
        max_access_count: Option<u32>,
        dry_run: bool,
    ) -> Result<CleanupResult> {
        maintenance::cleanup_unused(
            &self.db,
            max_unused_days.unwrap_or(self.maintenance.unused_days),
            max_access_count.unwrap_or(self.maintenance.unused_max_access_count),
            self.maintenance.batch_size,
            dry_run,
        )
    }

    // ── Export / import ─────────────────────────────────────────────────────

    pub fn export_session(&self, session_id: &str) -> Result<SessionExport> {
        self.db.with_conn(|c| transfer::export_session(c, session_id))
    }

    /// Import as a new session in one transaction.
    pub fn import_session(
        &self,
        export: &SessionExport,
        on_item: impl FnMut(),
    ) -> Result<ImportSummary> {
        self.db
            .run_in_transaction(|c| transfer::import_session(c, export, on_item))
    }
}
