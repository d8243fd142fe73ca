//! FILENAME: core/persistence/src/gateway.rs
//! PURPOSE: The Storage Gateway. Every SQL statement the application issues
//! is composed and executed here.
//! CONTEXT: Writes open an implicit transaction that stays open until
//! `commit()` (or `rollback()`), so nothing reaches the file until the form
//! layer decides a logical operation is complete. Reads inside the same
//! connection see uncommitted writes immediately.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params_from_iter, Connection};

use crate::error::StorageError;
use crate::predicate::{quote_ident, Predicate};
use crate::script::{split_statements, SetupScripts};
use crate::value::{Record, RowId, SqlValue};

/// Name of the primary key column every table carries.
pub const ID_COLUMN: &str = "ID";

/// Human-readable column used by lookup tables.
pub const NAME_COLUMN: &str = "name";

/// Sole interface to the relational backend.
pub struct Gateway {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Gateway {
    // ========================================================================
    // OPEN / CLOSE
    // ========================================================================

    /// Open the database at `path`, creating it from the setup scripts first
    /// when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>, scripts: &SetupScripts) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let fresh = !path.is_file();
        let conn = Connection::open(path)?;
        let gateway = Gateway {
            conn,
            path: Some(path.to_path_buf()),
        };

        if fresh {
            log::info!(target: "SQL", "creating database {}", path.display());
            if let Err(e) = gateway.create_from(scripts) {
                // A half-built file would be taken as existing on the next open.
                log::error!(target: "SQL", "setup of {} failed: {}", path.display(), e);
                drop(gateway);
                if let Err(rm) = fs::remove_file(path) {
                    log::warn!(target: "SQL", "could not remove {}: {}", path.display(), rm);
                }
                return Err(e);
            }
        }

        Ok(gateway)
    }

    /// Open a private in-memory database, populated from `scripts`.
    pub fn open_in_memory(scripts: &SetupScripts) -> Result<Self, StorageError> {
        let gateway = Gateway {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        gateway.create_from(scripts)?;
        Ok(gateway)
    }

    fn create_from(&self, scripts: &SetupScripts) -> Result<(), StorageError> {
        for script in scripts.paths() {
            let text = fs::read_to_string(script)?;
            self.run_script_named(&script.display().to_string(), &text)?;
        }
        self.commit()
    }

    /// File backing this gateway, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Commit outstanding work and close the connection.
    pub fn close(self) -> Result<(), StorageError> {
        self.commit()?;
        self.conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }

    // ========================================================================
    // TRANSACTION CONTROL
    // ========================================================================

    fn begin_if_needed(&self) -> Result<(), StorageError> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Make all writes since the last commit durable.
    pub fn commit(&self) -> Result<(), StorageError> {
        if self.has_pending_changes() {
            log::debug!(target: "SQL", "COMMIT");
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Discard all writes since the last commit.
    pub fn rollback(&self) -> Result<(), StorageError> {
        if self.has_pending_changes() {
            log::debug!(target: "SQL", "ROLLBACK");
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// True when writes are waiting for `commit()`.
    pub fn has_pending_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    // ========================================================================
    // RAW EXECUTION
    // ========================================================================

    /// Execute an arbitrary statement and collect its rows.
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>, StorageError> {
        log::debug!(target: "SQL", "SQL={} {:?}", sql, params);
        let mut stmt = self.conn.prepare(sql)?;
        if !stmt.readonly() {
            self.begin_if_needed()?;
        }

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), row.get::<_, SqlValue>(i)?);
            }
            out.push(record);
        }
        Ok(out)
    }

    /// Run a write statement and return the number of rows it changed.
    fn write(&self, sql: &str, params: &[SqlValue]) -> Result<usize, StorageError> {
        log::debug!(target: "SQL", "SQL={} {:?}", sql, params);
        self.begin_if_needed()?;
        Ok(self.conn.execute(sql, params_from_iter(params.iter()))?)
    }

    /// Execute every statement of a setup script.
    pub fn run_script(&self, script: &str) -> Result<(), StorageError> {
        self.run_script_named("<inline>", script)
    }

    fn run_script_named(&self, name: &str, script: &str) -> Result<(), StorageError> {
        self.begin_if_needed()?;
        for (index, statement) in split_statements(script).iter().enumerate() {
            log::debug!(target: "SQL", "SQL={}", statement);
            self.conn
                .execute_batch(statement)
                .map_err(|source| StorageError::Script {
                    script: name.to_string(),
                    index,
                    source,
                })?;
        }
        Ok(())
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Column names of `table` in declaration order.
    pub fn columns(&self, table: &str) -> Result<Vec<String>, StorageError> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table)?);
        let columns: Vec<String> = self
            .execute(&sql, &[])?
            .into_iter()
            .filter_map(|r| r.get("name").and_then(|v| v.as_text().map(String::from)))
            .collect();
        if columns.is_empty() {
            return Err(StorageError::UnknownTable(table.to_string()));
        }
        Ok(columns)
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Insert a row built from `record` and return its new identifier.
    pub fn insert(&self, table: &str, record: &Record) -> Result<RowId, StorageError> {
        let table_q = quote_ident(table)?;
        let sql = if record.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table_q)
        } else {
            let cols = record
                .column_names()
                .map(quote_ident)
                .collect::<Result<Vec<_>, _>>()?;
            let marks = vec!["?"; cols.len()].join(", ");
            format!("INSERT INTO {} ({}) VALUES ({})", table_q, cols.join(", "), marks)
        };
        let params: Vec<SqlValue> = record.values().cloned().collect();
        self.write(&sql, &params)?;
        Ok(RowId(self.conn.last_insert_rowid()))
    }

    /// Update every row matching `predicate` with the columns of `record`.
    pub fn update(
        &self,
        table: &str,
        record: &Record,
        predicate: &Predicate,
    ) -> Result<usize, StorageError> {
        if record.is_empty() {
            return Ok(0);
        }
        let assignments = record
            .column_names()
            .map(|c| quote_ident(c).map(|q| format!("{} = ?", q)))
            .collect::<Result<Vec<_>, _>>()?;
        let mut params: Vec<SqlValue> = record.values().cloned().collect();
        let clause = predicate.to_sql(&mut params)?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_ident(table)?,
            assignments.join(", "),
            clause
        );
        self.write(&sql, &params)
    }

    pub fn update_by_id(&self, table: &str, record: &Record, id: RowId) -> Result<usize, StorageError> {
        self.update(table, record, &Predicate::id(id))
    }

    /// Delete every row matching `predicate`.
    pub fn delete(&self, table: &str, predicate: &Predicate) -> Result<usize, StorageError> {
        let mut params = Vec::new();
        let clause = predicate.to_sql(&mut params)?;
        let sql = format!("DELETE FROM {} WHERE {}", quote_ident(table)?, clause);
        self.write(&sql, &params)
    }

    pub fn delete_row(&self, table: &str, id: RowId) -> Result<usize, StorageError> {
        self.delete(table, &Predicate::id(id))
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// True when some row has `value` in `column`.
    pub fn row_exists(&self, table: &str, column: &str, value: &SqlValue) -> Result<bool, StorageError> {
        let mut params = Vec::new();
        let clause = Predicate::Eq(column.to_string(), value.clone()).to_sql(&mut params)?;
        let sql = format!("SELECT 1 FROM {} WHERE {} LIMIT 1", quote_ident(table)?, clause);
        Ok(!self.execute(&sql, &params)?.is_empty())
    }

    /// Identifiers of the matching rows in the engine's natural order.
    pub fn ids_where(&self, table: &str, predicate: Option<&Predicate>) -> Result<Vec<RowId>, StorageError> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", quote_ident(ID_COLUMN)?, quote_ident(table)?);
        if let Some(p) = predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&p.to_sql(&mut params)?);
        }
        Ok(self
            .execute(&sql, &params)?
            .iter()
            .filter_map(|r| r.get(ID_COLUMN).and_then(SqlValue::as_row_id))
            .collect())
    }

    /// All columns of the row with `id`.
    pub fn row_by_id(&self, table: &str, id: RowId) -> Result<Option<Record>, StorageError> {
        Ok(self.rows_where(table, &Predicate::id(id))?.into_iter().next())
    }

    pub fn rows_where(&self, table: &str, predicate: &Predicate) -> Result<Vec<Record>, StorageError> {
        let mut params = Vec::new();
        let clause = predicate.to_sql(&mut params)?;
        let sql = format!("SELECT * FROM {} WHERE {}", quote_ident(table)?, clause);
        self.execute(&sql, &params)
    }

    /// First identifier whose `column` equals `value`.
    pub fn id_by_value(&self, table: &str, column: &str, value: &SqlValue) -> Result<Option<RowId>, StorageError> {
        let predicate = Predicate::Eq(column.to_string(), value.clone());
        Ok(self.ids_where(table, Some(&predicate))?.into_iter().next())
    }

    /// One column of one row. `None` when the row does not exist.
    pub fn single_value(&self, table: &str, column: &str, id: RowId) -> Result<Option<SqlValue>, StorageError> {
        let mut params = Vec::new();
        let clause = Predicate::id(id).to_sql(&mut params)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            quote_ident(column)?,
            quote_ident(table)?,
            clause
        );
        Ok(self
            .execute(&sql, &params)?
            .into_iter()
            .next()
            .and_then(|r| r.values().next().cloned()))
    }

    pub fn set_single_value(
        &self,
        table: &str,
        column: &str,
        id: RowId,
        value: impl Into<SqlValue>,
    ) -> Result<usize, StorageError> {
        self.update_by_id(table, &Record::new().with(column, value), id)
    }

    /// Every value of `column`, rendered as display text.
    pub fn populate_list(&self, table: &str, column: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .lookup_options(table, column)?
            .into_iter()
            .map(|(_, text)| text)
            .collect())
    }

    /// `(ID, column)` pairs of a lookup table in natural order.
    pub fn lookup_options(&self, table: &str, column: &str) -> Result<Vec<(RowId, String)>, StorageError> {
        let sql = format!(
            "SELECT {}, {} FROM {}",
            quote_ident(ID_COLUMN)?,
            quote_ident(column)?,
            quote_ident(table)?
        );
        Ok(self
            .execute(&sql, &[])?
            .into_iter()
            .filter_map(|r| {
                let id = r.get(ID_COLUMN).and_then(SqlValue::as_row_id)?;
                let text = r.get(column).map(SqlValue::to_display).unwrap_or_default();
                Some((id, text))
            })
            .collect())
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> Result<usize, StorageError> {
        let sql = format!("SELECT COUNT(*) AS n FROM {}", quote_ident(table)?);
        Ok(self
            .execute(&sql, &[])?
            .first()
            .and_then(|r| r.get("n").and_then(SqlValue::as_i64))
            .unwrap_or(0) as usize)
    }
}
