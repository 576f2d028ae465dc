//! Table introspection: column info and sample rows for the prompt.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TranslateError};
use crate::executor::row_to_json;

pub const DEFAULT_SAMPLE_ROWS: usize = 3;

/// One column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
  pub column_id: i64,
  pub name: String,
  #[serde(rename = "type")]
  pub data_type: String,
}

/// What the language model gets to see about a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaContext {
  pub table_name: String,
  pub columns: Vec<ColumnInfo>,
  pub sample: Vec<Vec<Value>>,
}

impl SchemaContext {
  /// Open the database read-only and load the context for `table`.
  pub fn open(path: impl AsRef<Path>, table: &str, sample_rows: usize) -> Result<Self> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    Self::load(&conn, table, sample_rows)
  }

  /// Load column info and the first `sample_rows` rows of `table`.
  pub fn load(conn: &Connection, table: &str, sample_rows: usize) -> Result<Self> {
    validate_identifier(table)?;

    let columns = column_info(conn, table)?;
    if columns.is_empty() {
      return Err(TranslateError::UnknownTable(table.to_string()));
    }
    let sample = sample_rows_of(conn, table, sample_rows)?;

    tracing::debug!(table, columns = columns.len(), rows = sample.len(), "loaded schema context");
    Ok(Self { table_name: table.to_string(), columns, sample })
  }

  /// Column info as pretty JSON, one object per column.
  pub fn column_info_text(&self) -> String {
    serde_json::to_string_pretty(&self.columns).unwrap_or_default()
  }

  /// Sample rows, one JSON array per line.
  pub fn sample_text(&self) -> String {
    self
      .sample
      .iter()
      .map(|row| serde_json::to_string(row).unwrap_or_default())
      .collect::<Vec<_>>()
      .join("\n")
  }
}

fn column_info(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
  let mut statement = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
  let columns = statement
    .query_map([], |row| {
      Ok(ColumnInfo { column_id: row.get(0)?, name: row.get(1)?, data_type: row.get(2)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(columns)
}

fn sample_rows_of(conn: &Connection, table: &str, limit: usize) -> Result<Vec<Vec<Value>>> {
  let mut statement = conn.prepare(&format!("SELECT * FROM \"{table}\" LIMIT ?1"))?;
  let width = statement.column_count();
  let rows = statement
    .query_map(params![limit as i64], |row| row_to_json(row, width))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_identifier(name: &str) -> Result<()> {
  let mut chars = name.chars();
  let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
  if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
    Ok(())
  } else {
    Err(TranslateError::InvalidTableName(name.to_string()))
  }
}
