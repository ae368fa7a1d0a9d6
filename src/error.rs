//! Typed errors returned by the memory store engine.
//!
//! SQLite failures are classified once, at the [`From<rusqlite::Error>`] boundary:
//! constraint failures (foreign keys, UNIQUE, CHECK, NOT NULL) become
//! [`StoreError::ConstraintViolation`], unreadable stored values become
//! [`StoreError::Serialization`], and everything else stays a raw database error.

use rusqlite::ErrorCode;

/// Errors surfaced by core operations. Callers branch on the variant; nothing
/// here is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A foreign key, uniqueness, range, or enumeration constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored JSON column or enum value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Begin, commit, or rollback of a transaction failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            rusqlite::Error::FromSqlConversionFailure(idx, _, ref source) => {
                Self::Serialization(format!("column {idx}: {source}"))
            }
            rusqlite::Error::InvalidColumnType(idx, ref name, ty) => {
                Self::Serialization(format!("column {idx} ({name}) has unexpected type {ty}"))
            }
            other => Self::Database(other),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Map a missing row to [`StoreError::NotFound`], classifying anything else.
pub(crate) fn or_not_found(err: rusqlite::Error, kind: &'static str, id: &str) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::not_found(kind, id),
        other => other.into(),
    }
}
