use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("table '{0}' does not exist")]
  UnknownTable(String),

  #[error("'{0}' is not a plain table identifier")]
  InvalidTableName(String),

  #[error("language model request timed out after {0:?}")]
  Timeout(Duration),

  #[error("language model transport failed: {0}")]
  Transport(String),

  #[error("language model returned status {status}: {message}")]
  Api { status: u16, message: String },

  #[error("could not extract SQL from model response: {0}")]
  MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, TranslateError>;
