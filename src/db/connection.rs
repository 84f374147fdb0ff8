//! SQLite connection management for the message database.
//!
//! CHANGELOG:
//! - 02/11/2026 - Pragmas from StoreConfig
//! - 01/27/2026 - Read-write open, parent directory creation

use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::Result;

/// Open (creating if needed) the database at `config.db_path` and apply the
/// configured pragmas.
pub fn open_db(config: &StoreConfig) -> Result<Connection> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open_with_flags(
        &config.db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    // journal_mode returns the resulting mode as a row.
    let mode: String = conn.query_row(
        &format!("PRAGMA journal_mode = {}", config.journal_mode),
        [],
        |row| row.get(0),
    )?;
    conn.execute_batch(&format!("PRAGMA synchronous = {}", config.synchronous))?;
    debug!(path = %config.db_path.display(), journal_mode = %mode, "database opened");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    Ok(Connection::open_in_memory()?)
}
