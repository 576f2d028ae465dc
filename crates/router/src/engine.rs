//! Router engine: utterance vector cache, scoring and the routing decision.
//!
//! The engine starts `Unprepared`. [`RouterEngine::prepare`] embeds every
//! utterance and publishes the finished cache in one swap, after which the
//! engine is `Ready` and the cache is never mutated again. `route()` on an
//! unprepared engine fails with [`RouterError::NotReady`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::decision::{self, RoutingDecision, TopicScore};
use crate::embedding::{check_dimension, validate_vector, EmbeddingClient};
use crate::error::{EmbeddingError, Result, RouterError};
use crate::similarity::{cosine_similarity, Aggregation};

/// Tunable routing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterSettings {
  /// Minimum topic score required to accept a match
  pub score_threshold: f32,
  /// How per-utterance similarities collapse into a topic score
  pub aggregation: Aggregation,
  /// Upper bound on each embedding call; `None` waits indefinitely
  pub embed_timeout: Option<Duration>,
}

pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.16;
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

impl Default for RouterSettings {
  fn default() -> Self {
    Self {
      score_threshold: DEFAULT_SCORE_THRESHOLD,
      aggregation: Aggregation::default(),
      embed_timeout: Some(DEFAULT_EMBED_TIMEOUT),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
  Unprepared,
  Ready,
}

/// Utterance vectors for one catalog, indexed `[topic][position]`.
#[derive(Debug)]
struct VectorCache {
  dimension: usize,
  topics: Vec<Vec<Vec<f32>>>,
}

pub struct RouterEngine {
  catalog: Catalog,
  client: Arc<dyn EmbeddingClient>,
  settings: RouterSettings,
  cache: RwLock<Option<Arc<VectorCache>>>,
  prepare_lock: Mutex<()>,
}

impl RouterEngine {
  /// Create an unprepared engine.
  pub fn new(catalog: Catalog, client: Arc<dyn EmbeddingClient>, settings: RouterSettings) -> Self {
    Self { catalog, client, settings, cache: RwLock::new(None), prepare_lock: Mutex::new(()) }
  }

  /// Create an engine and prepare it before returning.
  pub async fn prepared(
    catalog: Catalog,
    client: Arc<dyn EmbeddingClient>,
    settings: RouterSettings,
  ) -> Result<Self> {
    let engine = Self::new(catalog, client, settings);
    engine.prepare().await?;
    Ok(engine)
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn settings(&self) -> &RouterSettings {
    &self.settings
  }

  pub fn state(&self) -> EngineState {
    match self.snapshot() {
      Some(_) => EngineState::Ready,
      None => EngineState::Unprepared,
    }
  }

  /// Embed and cache every utterance in the catalog.
  ///
  /// Idempotent: once the engine is `Ready` this returns without calling the
  /// embedding client. Concurrent calls are serialized; on failure the engine
  /// stays `Unprepared`.
  pub async fn prepare(&self) -> Result<()> {
    let _guard = self.prepare_lock.lock().await;
    if self.snapshot().is_some() {
      return Ok(());
    }

    let cache = self.build_cache().await?;
    tracing::info!(
      topics = self.catalog.len(),
      utterances = self.catalog.utterance_count(),
      dimension = cache.dimension,
      "router prepared"
    );

    *self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::new(cache));
    Ok(())
  }

  /// Route a query to a single topic, or `Unmatched`.
  pub async fn route(&self, query: &str) -> Result<RoutingDecision> {
    let scores = self.scores(query).await?;
    let decision = decision::decide(&scores, self.settings.score_threshold);
    tracing::debug!(%decision, threshold = self.settings.score_threshold, "routed query");
    Ok(decision)
  }

  /// Every topic's aggregate score for `query`, in decision order.
  pub async fn scores(&self, query: &str) -> Result<Vec<TopicScore>> {
    if query.trim().is_empty() {
      return Err(RouterError::InvalidQuery);
    }
    let cache = self.snapshot().ok_or(RouterError::NotReady)?;

    let query_vector = self.with_timeout(self.client.embed(query)).await?;
    validate_vector(&query_vector)?;
    check_dimension(cache.dimension, &query_vector)?;

    let mut scores = Vec::with_capacity(self.catalog.len());
    for (topic, vectors) in self.catalog.topics().iter().zip(cache.topics.iter()) {
      let similarities: Vec<f32> =
        vectors.iter().map(|vector| cosine_similarity(&query_vector, vector)).collect();
      let Some(score) = self.settings.aggregation.aggregate(&similarities) else {
        continue;
      };
      if !score.is_finite() {
        return Err(
          EmbeddingError::MalformedResponse(format!(
            "non-finite similarity for topic '{}'",
            topic.name()
          ))
          .into(),
        );
      }
      tracing::debug!(topic = topic.name(), score, "topic score");
      scores.push(TopicScore::new(topic.name(), score));
    }

    decision::rank(&mut scores);
    Ok(scores)
  }

  fn snapshot(&self) -> Option<Arc<VectorCache>> {
    self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
  }

  async fn with_timeout<T>(
    &self,
    call: impl Future<Output = std::result::Result<T, EmbeddingError>>,
  ) -> std::result::Result<T, EmbeddingError> {
    match self.settings.embed_timeout {
      Some(limit) => {
        tokio::time::timeout(limit, call).await.map_err(|_| EmbeddingError::Timeout(limit))?
      }
      None => call.await,
    }
  }

  async fn build_cache(&self) -> Result<VectorCache> {
    // Identical utterance texts are embedded once.
    let mut unique: Vec<String> = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for topic in self.catalog.topics() {
      for utterance in topic.utterances() {
        index_of.entry(utterance.as_str()).or_insert_with(|| {
          unique.push(utterance.clone());
          unique.len() - 1
        });
      }
    }

    let vectors = self.with_timeout(self.client.embed_batch(&unique)).await?;
    if vectors.len() != unique.len() {
      return Err(
        EmbeddingError::MalformedResponse(format!(
          "expected {} utterance embeddings, got {}",
          unique.len(),
          vectors.len()
        ))
        .into(),
      );
    }

    let dimension = vectors.first().map(Vec::len).unwrap_or_default();
    for vector in &vectors {
      validate_vector(vector)?;
      check_dimension(dimension, vector)?;
    }

    let topics = self
      .catalog
      .topics()
      .iter()
      .map(|topic| {
        topic
          .utterances()
          .iter()
          .map(|utterance| vectors[index_of[utterance.as_str()]].clone())
          .collect()
      })
      .collect();

    Ok(VectorCache { dimension, topics })
  }
}
