//! Generic single-table access: DDL ownership, counts, bulk deletes and
//! parameterized raw SQL.
//!
//! Every query goes through [`Table::query`], which builds the
//! [`ColumnIndex`] once per statement and hands each row to the caller's
//! decoder.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use super::row::{ColumnIndex, RowReader};
use crate::error::Result;

/// Ordered column name / value pairs for one row.
pub type ColumnMap = Vec<(&'static str, Value)>;

/// One table on a borrowed connection.
#[derive(Clone, Copy)]
pub struct Table<'c> {
    conn: &'c Connection,
    name: &'static str,
}

impl<'c> Table<'c> {
    pub fn new(conn: &'c Connection, name: &'static str) -> Self {
        Self { conn, name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Execute the table's DDL. Emitted once for a fresh database; migrating
    /// an existing table is someone else's job.
    pub fn create(&self, statements: &[String]) -> Result<()> {
        for statement in statements {
            self.conn.execute_batch(statement)?;
        }
        info!(table = self.name, "table created");
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        self.count_where(None, &[])
    }

    /// `SELECT COUNT(*)` with an optional WHERE clause.
    pub fn count_where(&self, clause: Option<&str>, params: &[Value]) -> Result<i64> {
        let mut sql = format!("SELECT COUNT(*) FROM `{}`", self.name);
        if let Some(c) = clause {
            sql.push_str(" WHERE ");
            sql.push_str(c);
        }
        let count = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count)
    }

    pub fn delete_all(&self) -> Result<usize> {
        let affected = self.conn.execute(&format!("DELETE FROM `{}`", self.name), [])?;
        info!(table = self.name, affected, "deleted all rows");
        Ok(affected)
    }

    pub fn drop_table(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS `{}`", self.name))?;
        info!(table = self.name, "table dropped");
        Ok(())
    }

    /// Point existence check by local id.
    pub fn exists(&self, id: i64) -> Result<bool> {
        let found = self.count_where(Some("`id` = ?"), &[Value::Integer(id)])?;
        Ok(found > 0)
    }

    /// Insert one row and return the generated id.
    ///
    /// Constraint violations are returned to the caller unchanged.
    pub fn insert(&self, columns: &ColumnMap) -> Result<i64> {
        let names: Vec<String> = columns.iter().map(|(n, _)| format!("`{n}`")).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO `{}` ({}) VALUES ({})",
            self.name,
            names.join(", "),
            placeholders
        );
        self.conn
            .execute(&sql, params_from_iter(columns.iter().map(|(_, v)| v)))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite the given columns of the row with `id`. Returns affected rows.
    pub fn update(&self, id: i64, columns: &ColumnMap) -> Result<usize> {
        let assignments: Vec<String> = columns.iter().map(|(n, _)| format!("`{n}` = ?")).collect();
        let sql = format!(
            "UPDATE `{}` SET {} WHERE `id` = ?",
            self.name,
            assignments.join(", ")
        );
        let params = columns
            .iter()
            .map(|(_, v)| v.clone())
            .chain(std::iter::once(Value::Integer(id)));
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }

    /// `UPDATE <table> SET <assignments> WHERE <clause>`.
    pub fn update_where(&self, assignments: &str, clause: &str, params: &[Value]) -> Result<usize> {
        let sql = format!("UPDATE `{}` SET {} WHERE {}", self.name, assignments, clause);
        debug!(sql = %sql, "bulk update");
        Ok(self.conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    pub fn delete_where(&self, clause: &str, params: &[Value]) -> Result<usize> {
        let sql = format!("DELETE FROM `{}` WHERE {}", self.name, clause);
        Ok(self.conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    /// Run a query and decode every row.
    pub fn query<T, F>(&self, sql: &str, params: &[Value], mut decode: F) -> Result<Vec<T>>
    where
        F: FnMut(&RowReader<'_, '_>) -> T,
    {
        debug!(table = self.name, sql = %sql, params = params.len(), "query");
        let mut stmt = self.conn.prepare(sql)?;
        let index = ColumnIndex::for_statement(&stmt);
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(decode(&RowReader::new(row, &index)));
        }
        Ok(result)
    }

    /// First row of a query, or `None`.
    pub fn query_first<T, F>(&self, sql: &str, params: &[Value], decode: F) -> Result<Option<T>>
    where
        F: FnMut(&RowReader<'_, '_>) -> T,
    {
        Ok(self.query(sql, params, decode)?.into_iter().next())
    }
}

/// `?, ?, ?` for `n` parameters.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(conn: &Connection) -> Table<'_> {
        let table = Table::new(conn, "scratch");
        table
            .create(&["CREATE TABLE `scratch` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, `name` VARCHAR UNIQUE)".to_string()])
            .unwrap();
        table
    }

    fn row(name: &str) -> ColumnMap {
        vec![("name", Value::Text(name.to_string()))]
    }

    #[test]
    fn test_insert_count_exists() {
        let conn = Connection::open_in_memory().unwrap();
        let table = scratch(&conn);

        let a = table.insert(&row("a")).unwrap();
        let b = table.insert(&row("b")).unwrap();
        assert!(b > a);
        assert_eq!(table.count().unwrap(), 2);
        assert!(table.exists(a).unwrap());
        assert!(!table.exists(b + 100).unwrap());
    }

    #[test]
    fn test_unique_violation_propagates() {
        let conn = Connection::open_in_memory().unwrap();
        let table = scratch(&conn);
        table.insert(&row("dup")).unwrap();
        let err = table.insert(&row("dup")).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_update_reports_affected_rows() {
        let conn = Connection::open_in_memory().unwrap();
        let table = scratch(&conn);
        let id = table.insert(&row("before")).unwrap();

        assert_eq!(table.update(id, &row("after")).unwrap(), 1);
        assert_eq!(table.update(id + 1, &row("ghost")).unwrap(), 0);

        let names = table
            .query("SELECT * FROM `scratch`", &[], |r| r.get_string("name"))
            .unwrap();
        assert_eq!(names, vec![Some("after".to_string())]);
    }

    #[test]
    fn test_delete_all_and_drop() {
        let conn = Connection::open_in_memory().unwrap();
        let table = scratch(&conn);
        table.insert(&row("a")).unwrap();
        table.insert(&row("b")).unwrap();

        assert_eq!(table.delete_all().unwrap(), 2);
        assert_eq!(table.count().unwrap(), 0);
        table.drop_table().unwrap();
        assert!(table.count().is_err());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(0), "");
    }
}
