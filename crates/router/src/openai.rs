//! OpenAI-compatible embeddings client
//!
//! Works against any endpoint implementing `POST <base_url>/embeddings`
//! (OpenAI, OpenRouter, LM Studio, vLLM, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::embedding::{validate_vector, EmbeddingClient};
use crate::error::EmbeddingError;

/// Configuration for the embeddings HTTP client
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
  /// Base URL of the API (e.g., "https://api.openai.com/v1")
  pub base_url: String,
  /// Embedding model name
  pub model: String,
  /// Bearer token, if the endpoint needs one
  pub api_key: Option<String>,
  /// Per-request timeout
  pub timeout: Duration,
}

impl Default for OpenAiEmbeddingConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.openai.com/v1".to_string(),
      model: "text-embedding-3-small".to_string(),
      api_key: None,
      timeout: Duration::from_secs(30),
    }
  }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
  embedding: Vec<f32>,
  index: usize,
}

/// HTTP embedding client for OpenAI-style APIs
pub struct OpenAiEmbeddingClient {
  client: Client,
  config: OpenAiEmbeddingConfig,
}

impl OpenAiEmbeddingClient {
  pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self, EmbeddingError> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| EmbeddingError::Transport(format!("failed to create HTTP client: {e}")))?;

    Ok(Self { client, config })
  }

  pub fn config(&self) -> &OpenAiEmbeddingConfig {
    &self.config
  }

  fn endpoint(&self) -> String {
    format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
  }

  async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let body = EmbeddingRequest { model: &self.config.model, input: texts };

    let mut request = self.client.post(self.endpoint()).json(&body);
    if let Some(key) = &self.config.api_key {
      request = request.bearer_auth(key);
    }

    let response = request.send().await.map_err(|e| self.transport_error(e))?;

    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(EmbeddingError::Api { status: status.as_u16(), message });
    }

    let parsed: EmbeddingResponse = response
      .json()
      .await
      .map_err(|e| EmbeddingError::MalformedResponse(format!("invalid response body: {e}")))?;

    tracing::debug!(count = texts.len(), model = %self.config.model, "received embeddings");
    order_embeddings(parsed.data, texts.len())
  }

  fn transport_error(&self, error: reqwest::Error) -> EmbeddingError {
    if error.is_timeout() {
      EmbeddingError::Timeout(self.config.timeout)
    } else {
      EmbeddingError::Transport(error.to_string())
    }
  }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let mut vectors = self.request(&[text.to_string()]).await?;
    vectors
      .pop()
      .ok_or_else(|| EmbeddingError::MalformedResponse("no embedding returned".to_string()))
  }

  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }
    self.request(texts).await
  }
}

/// Put the response items back into request order and validate them.
fn order_embeddings(
  data: Vec<EmbeddingData>,
  expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
  if data.len() != expected {
    return Err(EmbeddingError::MalformedResponse(format!(
      "expected {expected} embeddings, got {}",
      data.len()
    )));
  }

  let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
  for item in data {
    let slot = slots.get_mut(item.index).ok_or_else(|| {
      EmbeddingError::MalformedResponse(format!("embedding index {} out of range", item.index))
    })?;
    if slot.is_some() {
      return Err(EmbeddingError::MalformedResponse(format!(
        "duplicate embedding index {}",
        item.index
      )));
    }
    validate_vector(&item.embedding)?;
    *slot = Some(item.embedding);
  }

  // Every slot is filled: counts match and no index repeated.
  Ok(slots.into_iter().flatten().collect())
}
