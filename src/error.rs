//! Storage error types.

use thiserror::Error;

use crate::model::OwnerKind;

/// Errors returned by the message stores.
///
/// Soft data corruption (unknown enum values, unreadable JSON columns) is
/// logged and never surfaces here.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record belongs to a {found} conversation, store holds {expected} messages")]
    OwnerMismatch { expected: OwnerKind, found: OwnerKind },
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// True for UNIQUE / PRIMARY KEY violations reported by SQLite.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
