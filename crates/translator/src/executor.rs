//! Executes generated SQL against the SQLite database.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Column names plus rows, each row in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
  pub columns: Vec<String>,
  pub rows: Vec<Vec<Value>>,
}

/// Runs queries on a database file. Connections are read-only and opened
/// per call, so generated SQL cannot modify the data.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
  path: PathBuf,
}

impl SqliteExecutor {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn execute(&self, sql: &str) -> Result<QueryResult> {
    let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    execute_on(&conn, sql)
  }
}

/// Run `sql` on an open connection and collect every row.
pub fn execute_on(conn: &Connection, sql: &str) -> Result<QueryResult> {
  let mut statement = conn.prepare(sql)?;
  let columns: Vec<String> = statement.column_names().into_iter().map(String::from).collect();
  let width = columns.len();

  let rows = statement
    .query_map([], |row| row_to_json(row, width))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  tracing::debug!(rows = rows.len(), "executed query");
  Ok(QueryResult { columns, rows })
}

pub(crate) fn row_to_json(row: &Row<'_>, width: usize) -> rusqlite::Result<Vec<Value>> {
  (0..width).map(|index| row.get_ref(index).map(value_to_json)).collect()
}

fn value_to_json(value: ValueRef<'_>) -> Value {
  match value {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::from(i),
    ValueRef::Real(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
    ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
  }
}
