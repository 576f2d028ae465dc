//! Extracting the SQL statement from a model reply.

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, TranslateError};

#[derive(Deserialize)]
struct SqlAnswer {
  sql_query: String,
}

/// Pull `sql_query` out of the model's JSON answer.
///
/// Models often wrap the object in a Markdown fence or add a sentence around
/// it, so the first `{ ... }` span is tried when the whole reply does not
/// parse.
pub fn parse_sql_response(text: &str) -> Result<String> {
  let trimmed = text.trim();
  let answer = serde_json::from_str::<SqlAnswer>(trimmed).or_else(|first_error| {
    extract_object(trimmed)
      .and_then(|object| serde_json::from_str::<SqlAnswer>(object).ok())
      .ok_or_else(|| TranslateError::MalformedResponse(first_error.to_string()))
  })?;

  let sql = answer.sql_query.trim();
  if sql.is_empty() {
    return Err(TranslateError::MalformedResponse("sql_query is empty".to_string()));
  }
  Ok(sql.to_string())
}

fn extract_object(text: &str) -> Option<&str> {
  let pattern = Regex::new(r"(?s)\{.*\}").ok()?;
  pattern.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_plain_json_answer() {
    let sql = parse_sql_response(r#"{"sql_query": "SELECT * FROM cars_data"}"#).unwrap();
    assert_eq!(sql, "SELECT * FROM cars_data");
  }

  #[test]
  fn test_fenced_answer() {
    let reply = "```json\n{\"sql_query\": \"SELECT population FROM countries_data WHERE country = 'Egypt'\"}\n```";
    assert_eq!(
      parse_sql_response(reply).unwrap(),
      "SELECT population FROM countries_data WHERE country = 'Egypt'"
    );
  }

  #[test]
  fn test_answer_with_surrounding_prose() {
    let reply = "Sure! Here it is:\n{\"sql_query\": \"SELECT 1\"}\nLet me know if you need more.";
    assert_eq!(parse_sql_response(reply).unwrap(), "SELECT 1");
  }

  #[test]
  fn test_raw_sql_is_malformed() {
    let result = parse_sql_response("SELECT * FROM cars_data");
    assert!(matches!(result, Err(TranslateError::MalformedResponse(_))));
  }

  #[test]
  fn test_missing_key_is_malformed() {
    let result = parse_sql_response(r#"{"query": "SELECT 1"}"#);
    assert!(matches!(result, Err(TranslateError::MalformedResponse(_))));
  }

  #[test]
  fn test_blank_sql_is_malformed() {
    let result = parse_sql_response(r#"{"sql_query": "   "}"#);
    assert!(matches!(result, Err(TranslateError::MalformedResponse(_))));
  }
}
