//! Row decoding with a query-scoped column index.
//!
//! A [`ColumnIndex`] is built once from a prepared statement and then shared by
//! every row that statement yields. It lives exactly as long as the query, so
//! it is never shared between concurrently running queries.
//!
//! Getters return `None` for SQL NULL, for a missing column and for a value
//! that cannot be read as the requested type. The last two cases are logged;
//! a single bad cell must not abort a page of results.

use chrono::{DateTime, Utc};
use rusqlite::types::FromSql;
use rusqlite::{Row, Statement};
use std::collections::HashMap;
use tracing::warn;

/// Column name to position, for one query shape.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn for_statement(stmt: &Statement<'_>) -> Self {
        let mut positions = HashMap::new();
        for (i, name) in stmt.column_names().into_iter().enumerate() {
            // First occurrence wins when a join repeats a column name.
            positions.entry(name.to_string()).or_insert(i);
        }
        Self { positions }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Typed, name-based access to the current row.
pub struct RowReader<'a, 'stmt> {
    row: &'a Row<'stmt>,
    index: &'a ColumnIndex,
}

impl<'a, 'stmt> RowReader<'a, 'stmt> {
    pub fn new(row: &'a Row<'stmt>, index: &'a ColumnIndex) -> Self {
        Self { row, index }
    }

    fn get<T: FromSql>(&self, column: &str) -> Option<T> {
        let Some(position) = self.index.position(column) else {
            warn!(column, "column not present in result set");
            return None;
        };
        match self.row.get::<_, Option<T>>(position) {
            Ok(value) => value,
            Err(e) => {
                warn!(column, error = %e, "unreadable column value");
                None
            }
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.position(column).is_some()
    }

    pub fn get_string(&self, column: &str) -> Option<String> {
        self.get::<String>(column)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get::<i64>(column)
    }

    pub fn get_i32(&self, column: &str) -> Option<i32> {
        self.get::<i32>(column)
    }

    pub fn get_blob(&self, column: &str) -> Option<Vec<u8>> {
        self.get::<Vec<u8>>(column)
    }

    /// Integer column holding 0 / 1.
    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get_i64(column).map(|v| v != 0)
    }

    /// Integer column holding milliseconds since the Unix epoch.
    pub fn get_date(&self, column: &str) -> Option<DateTime<Utc>> {
        let millis = self.get_i64(column)?;
        let date = DateTime::from_timestamp_millis(millis);
        if date.is_none() {
            warn!(column, millis, "timestamp out of range");
        }
        date
    }
}
