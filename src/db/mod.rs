//! Database module: connection, schema and the three message stores.
//!
//! CHANGELOG:
//! - 02/04/2026 - Database facade over the per-owner stores
//! - 01/27/2026 - Initial module structure

pub mod codec;
pub mod connection;
pub mod filter;
pub mod owner;
pub mod queries;
pub mod row;
pub mod schema;
pub mod store;
pub mod table;

use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::OwnerKind;
use owner::{ContactOwner, DistributionListOwner, GroupOwner, Owner};
use store::MessageStore;

pub use filter::MessageFilter;

/// Owns the one connection every store borrows.
pub struct Database {
    conn: Connection,
}

/// Row counts of one message table.
#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    pub kind: OwnerKind,
    pub table: &'static str,
    pub messages: i64,
    pub starred: i64,
}

impl Database {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            conn: connection::open_db(config)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn contact_messages(&self) -> MessageStore<'_, ContactOwner> {
        MessageStore::new(&self.conn)
    }

    pub fn group_messages(&self) -> MessageStore<'_, GroupOwner> {
        MessageStore::new(&self.conn)
    }

    pub fn distribution_list_messages(&self) -> MessageStore<'_, DistributionListOwner> {
        MessageStore::new(&self.conn)
    }

    /// Create all three message tables and their indexes.
    pub fn create_schema(&self) -> Result<()> {
        self.contact_messages().create_table()?;
        self.group_messages().create_table()?;
        self.distribution_list_messages().create_table()?;
        Ok(())
    }

    /// Minimal owner tables for the archived-owner join.
    pub fn create_owner_tables(&self) -> Result<()> {
        for ddl in [
            ContactOwner::owner_table_ddl(),
            GroupOwner::owner_table_ddl(),
            DistributionListOwner::owner_table_ddl(),
        ] {
            self.conn.execute_batch(&ddl)?;
        }
        info!("owner tables created");
        Ok(())
    }

    /// Startup recovery across every message table.
    pub fn mark_unscheduled_as_failed(&self) -> Result<usize> {
        Ok(self.contact_messages().mark_unscheduled_as_failed()?
            + self.group_messages().mark_unscheduled_as_failed()?
            + self.distribution_list_messages().mark_unscheduled_as_failed()?)
    }

    pub fn stats(&self) -> Result<Vec<TableStats>> {
        fn of<O: Owner>(store: &MessageStore<'_, O>) -> Result<TableStats> {
            Ok(TableStats {
                kind: O::KIND,
                table: O::TABLE,
                messages: store.count()?,
                starred: store.count_starred()?,
            })
        }
        Ok(vec![
            of(&self.contact_messages())?,
            of(&self.group_messages())?,
            of(&self.distribution_list_messages())?,
        ])
    }
}
