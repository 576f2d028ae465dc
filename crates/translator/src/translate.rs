use std::sync::Arc;

use crate::error::Result;
use crate::model::LanguageModel;
use crate::prompt::render_prompt;
use crate::response::parse_sql_response;
use crate::schema::SchemaContext;

/// Turns a question routed to `topic` into a SQL statement.
pub struct Translator {
  model: Arc<dyn LanguageModel>,
}

impl Translator {
  pub fn new(model: Arc<dyn LanguageModel>) -> Self {
    Self { model }
  }

  pub async fn translate(
    &self,
    query: &str,
    topic: &str,
    schema: &SchemaContext,
  ) -> Result<String> {
    let prompt = render_prompt(query, schema);
    tracing::debug!(topic, table = %schema.table_name, "requesting SQL translation");

    let reply = self.model.complete(&prompt).await?;
    let sql = parse_sql_response(&reply).inspect_err(|e| {
      tracing::warn!(topic, error = %e, "model reply did not contain a usable SQL query");
    })?;

    tracing::debug!(topic, %sql, "translated query");
    Ok(sql)
  }
}
