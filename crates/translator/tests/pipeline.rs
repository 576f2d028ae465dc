use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;
use translator::{LanguageModel, SchemaContext, SqliteExecutor, TranslateError, Translator};

/// Replies with a fixed answer and remembers the last prompt it saw.
struct CannedModel {
  reply: String,
  last_prompt: Mutex<Option<String>>,
}

impl CannedModel {
  fn new(reply: &str) -> Self {
    Self { reply: reply.to_string(), last_prompt: Mutex::new(None) }
  }
}

#[async_trait]
impl LanguageModel for CannedModel {
  async fn complete(&self, prompt: &str) -> Result<String, TranslateError> {
    *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
    Ok(self.reply.clone())
  }
}

fn countries_db(dir: &TempDir) -> std::path::PathBuf {
  let path = dir.path().join("data.db");
  let conn = Connection::open(&path).unwrap();
  conn
    .execute_batch(
      "CREATE TABLE countries_data (country TEXT, capital TEXT, population INTEGER);
       INSERT INTO countries_data VALUES ('Egypt', 'Cairo', 104258327);
       INSERT INTO countries_data VALUES ('Peru', 'Lima', 33715471);
       INSERT INTO countries_data VALUES ('Japan', 'Tokyo', 123951692);
       INSERT INTO countries_data VALUES ('Chile', 'Santiago', 19629590);",
    )
    .unwrap();
  path
}

#[tokio::test]
async fn test_question_to_rows() {
  let dir = TempDir::new().unwrap();
  let path = countries_db(&dir);

  let schema = SchemaContext::open(&path, "countries_data", 3).unwrap();
  assert_eq!(schema.sample.len(), 3);

  let model = Arc::new(CannedModel::new(
    "Sure! {\"sql_query\": \"SELECT population FROM countries_data WHERE country = 'Egypt'\"}",
  ));
  let translator = Translator::new(model.clone());

  let sql = translator
    .translate("How many habitants does Egypt have?", "countries", &schema)
    .await
    .unwrap();
  let result = SqliteExecutor::new(&path).execute(&sql).unwrap();

  assert_eq!(result.columns, vec!["population".to_string()]);
  assert_eq!(result.rows, vec![vec![json!(104258327)]]);

  let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
  assert!(prompt.contains("\"Cairo\""));
  assert!(!prompt.contains("Santiago"), "only the sampled rows reach the prompt");
}

#[test]
fn test_unknown_table_is_reported() {
  let dir = TempDir::new().unwrap();
  let path = countries_db(&dir);

  let result = SchemaContext::open(&path, "planets_data", 3);
  assert!(matches!(result, Err(TranslateError::UnknownTable(name)) if name == "planets_data"));
}

#[test]
fn test_executor_refuses_writes() {
  let dir = TempDir::new().unwrap();
  let path = countries_db(&dir);

  let result = SqliteExecutor::new(&path).execute("DELETE FROM countries_data");
  assert!(matches!(result, Err(TranslateError::Database(_))));

  let remaining =
    SqliteExecutor::new(&path).execute("SELECT COUNT(*) FROM countries_data").unwrap();
  assert_eq!(remaining.rows, vec![vec![json!(4)]]);
}
