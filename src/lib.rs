//! msgstore library
//!
//! SQLite storage and query layer for contact, group and distribution-list
//! messages. All access is synchronous on one borrowed connection.
//!
//! CHANGELOG:
//! - 01/27/2026 - Initial library structure

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod output;

pub use config::StoreConfig;
pub use db::{Database, MessageFilter};
pub use error::{Result, StoreError};
pub use model::{MessageRecord, MessageState, MessageType, OwnerKey, OwnerKind};
