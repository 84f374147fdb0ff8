//! Store configuration: database location and connection pragmas.
//!
//! Path resolution order:
//! 1. Explicit path (CLI `--db`, `~` expanded)
//! 2. `MSGSTORE_DB_PATH` env var
//! 3. `<data dir>/msgstore/messages.db`
//!
//! A JSON config file (`--config` or `MSGSTORE_CONFIG`) may set any field.
//! A `db_path` in the file wins over the env var; the CLI path wins over both.
//!
//! CHANGELOG:
//! - 02/11/2026 - Added JSON config file support
//! - 01/27/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

pub const DB_PATH_ENV: &str = "MSGSTORE_DB_PATH";
pub const CONFIG_PATH_ENV: &str = "MSGSTORE_CONFIG";

/// Connection settings for a message database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    /// `journal_mode` pragma, applied to file databases only.
    pub journal_mode: String,
    /// `synchronous` pragma.
    pub synchronous: String,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// Load a config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::load_file(path.as_ref())?.0)
    }

    /// The parsed file plus whether it named a `db_path` itself.
    fn load_file(path: &Path) -> Result<(Self, bool)> {
        let content = std::fs::read_to_string(path)?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;
        let has_db_path = raw.get("db_path").is_some_and(|v| !v.is_null());
        let mut config: StoreConfig = serde_json::from_value(raw)?;
        config.db_path = expand_path(&config.db_path.to_string_lossy());
        config.validate()?;
        Ok((config, has_db_path))
    }

    /// Resolve the effective configuration from optional CLI values and the
    /// environment.
    pub fn resolve(db_path: Option<&str>, config_path: Option<&str>) -> Result<Self> {
        let config_path = config_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());
        Self::resolve_with(db_path, config_path.as_deref(), std::env::var(DB_PATH_ENV).ok())
    }

    fn resolve_with(
        db_path: Option<&str>,
        config_path: Option<&str>,
        env_db_path: Option<String>,
    ) -> Result<Self> {
        let (mut config, file_sets_path) = match config_path {
            Some(p) => Self::load_file(&expand_path(p))?,
            None => (Self::default(), false),
        };

        if let Some(p) = db_path {
            config.db_path = expand_path(p);
        } else if let (false, Some(env_path)) = (file_sets_path, env_db_path) {
            config.db_path = expand_path(&env_path);
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        const JOURNAL_MODES: [&str; 6] = ["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];
        const SYNC_MODES: [&str; 4] = ["OFF", "NORMAL", "FULL", "EXTRA"];

        if !JOURNAL_MODES.contains(&self.journal_mode.to_ascii_uppercase().as_str()) {
            return Err(StoreError::Config(format!(
                "unknown journal_mode '{}'",
                self.journal_mode
            )));
        }
        if !SYNC_MODES.contains(&self.synchronous.to_ascii_uppercase().as_str()) {
            return Err(StoreError::Config(format!(
                "unknown synchronous mode '{}'",
                self.synchronous
            )));
        }
        Ok(())
    }
}

/// Default database path under the platform data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("msgstore")
        .join("messages.db")
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
