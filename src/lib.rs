//! Working memory for security-assessment agents: session-scoped findings,
//! a typed relationship graph, ranked search, and context snapshots, all in a
//! single embedded SQLite file.
//!
//! A **session** is one engagement (a pentest, a code review, an incident).
//! Each session owns **memory entries**, and every entry carries a category, a
//! priority from 0 to 10, and a confidence from 0 to 1. Entries link to one
//! another through directed, typed **relationships**. A **context snapshot**
//! freezes caller-supplied state together with a text summary of the session's
//! top findings.
//!
//! | Category | Typical use |
//! |----------|-------------|
//! | `vulnerability`, `finding` | Confirmed issues |
//! | `exploit`, `payload`, `technique` | Offensive material |
//! | `hypothesis`, `evidence` | Work in progress |
//! | `recommendation`, `note`, `context` | Everything else |
//!
//! # Architecture
//!
//! - **Storage**: SQLite in WAL mode with cascading foreign keys and an
//!   optional FTS5 index kept in sync by triggers
//! - **Search**: FTS5 or substring matching, filtered and ordered by priority,
//!   confidence, and recency, with a deterministic relevance score
//! - **Access tracking**: reading an entry by id bumps its access counter
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: database handle, schema, and transaction scoping
//! - [`engine`]: the [`TinyBrain`] facade over every operation
//! - [`error`]: the typed [`StoreError`]
//! - [`memory`]: sessions, entries, search, relationships, snapshots, tasks,
//!   statistics, cleanup, and export/import

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod memory;

pub use engine::TinyBrain;
pub use error::{Result, StoreError};
