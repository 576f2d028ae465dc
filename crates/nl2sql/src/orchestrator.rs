//! Wires routing, translation and execution together.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use router::{
  Catalog, EmbeddingClient, OpenAiEmbeddingClient, RouterEngine, RoutingDecision, TopicScore,
};
use translator::{
  ChatCompletionsClient, LanguageModel, QueryResult, SchemaContext, SqliteExecutor, Translator,
};

use crate::config::AppConfig;

/// Result of [`Pipeline::ask`].
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
  /// No topic cleared the threshold; nothing was sent to the language model.
  Unmatched,
  Translated {
    topic: String,
    table: String,
    sql: String,
    /// `None` on a dry run
    result: Option<QueryResult>,
  },
}

pub struct Pipeline {
  engine: RouterEngine,
  translator: Translator,
  executor: SqliteExecutor,
  database: PathBuf,
  tables: BTreeMap<String, String>,
  sample_rows: usize,
}

impl Pipeline {
  /// Build the pipeline with the HTTP clients described by `config`.
  pub fn from_config(config: &AppConfig) -> Result<Self> {
    let embedder = OpenAiEmbeddingClient::new(config.embedding.client_config())
      .context("failed to create embedding client")?;
    let model = ChatCompletionsClient::new(config.llm.client_config())
      .context("failed to create LLM client")?;
    Self::new(config, Arc::new(embedder), Arc::new(model))
  }

  /// Build the pipeline around the given clients.
  ///
  /// Fails if the catalog is invalid or a topic has no table mapped to it.
  /// The router is left unprepared.
  pub fn new(
    config: &AppConfig,
    embedder: Arc<dyn EmbeddingClient>,
    model: Arc<dyn LanguageModel>,
  ) -> Result<Self> {
    let catalog = Catalog::from_config(&config.topics()?).context("invalid topic catalog")?;

    let unmapped: Vec<&str> = catalog
      .topics()
      .iter()
      .map(|topic| topic.name())
      .filter(|name| !config.database.tables.contains_key(*name))
      .collect();
    if !unmapped.is_empty() {
      return Err(anyhow!("no table configured for topic(s): {}", unmapped.join(", ")));
    }

    let engine = RouterEngine::new(catalog, embedder, config.router.settings());
    Ok(Self {
      engine,
      translator: Translator::new(model),
      executor: SqliteExecutor::new(&config.database.path),
      database: config.database.path.clone(),
      tables: config.database.tables.clone(),
      sample_rows: config.database.sample_rows,
    })
  }

  pub fn engine(&self) -> &RouterEngine {
    &self.engine
  }

  /// Table mapped to `topic`.
  pub fn table_for(&self, topic: &str) -> Option<&str> {
    self.tables.get(topic).map(String::as_str)
  }

  pub async fn prepare(&self) -> Result<()> {
    self.engine.prepare().await.context("failed to prepare the router")
  }

  pub async fn route(&self, query: &str) -> Result<RoutingDecision> {
    self.engine.route(query).await.context("failed to route query")
  }

  pub async fn scores(&self, query: &str) -> Result<Vec<TopicScore>> {
    self.engine.scores(query).await.context("failed to score query")
  }

  /// Route `query`, translate it against the chosen table and, unless
  /// `dry_run`, execute the SQL.
  pub async fn ask(&self, query: &str, dry_run: bool) -> Result<Answer> {
    let decision = self.route(query).await?;
    let Some(topic) = decision.topic() else {
      tracing::info!(query, "query matched no topic");
      return Ok(Answer::Unmatched);
    };

    let table = self
      .table_for(topic)
      .ok_or_else(|| anyhow!("no table configured for topic '{topic}'"))?;
    let schema = SchemaContext::open(&self.database, table, self.sample_rows)
      .with_context(|| format!("failed to read table '{table}' from {}", self.database.display()))?;

    let sql = self
      .translator
      .translate(query, topic, &schema)
      .await
      .context("failed to translate query")?;
    let result = if dry_run {
      None
    } else {
      Some(self.executor.execute(&sql).with_context(|| format!("failed to execute: {sql}"))?)
    };

    Ok(Answer::Translated { topic: topic.to_string(), table: table.to_string(), sql, result })
  }
}
