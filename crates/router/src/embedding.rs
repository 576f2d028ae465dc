//! Embedding client abstraction
//!
//! The router only needs a deterministic mapping from text to a fixed-length
//! vector. Providers implement [`EmbeddingClient`]; tests inject their own.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Maps text to an embedding vector.
///
/// Implementations must be `Send + Sync` so one client can be shared by
/// concurrent `route()` calls. Retries, if any, belong to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
  /// Embed a single text.
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

  /// Embed several texts, returning one vector per input in input order.
  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut vectors = Vec::with_capacity(texts.len());
    for text in texts {
      vectors.push(self.embed(text).await?);
    }
    Ok(vectors)
  }
}

/// Reject empty vectors and non-finite components.
pub fn validate_vector(vector: &[f32]) -> Result<(), EmbeddingError> {
  if vector.is_empty() {
    return Err(EmbeddingError::MalformedResponse("empty embedding vector".to_string()));
  }
  if let Some(index) = vector.iter().position(|value| !value.is_finite()) {
    return Err(EmbeddingError::MalformedResponse(format!(
      "non-finite value at component {index}"
    )));
  }
  Ok(())
}

/// Ensure `vector` has the expected dimension.
pub fn check_dimension(expected: usize, vector: &[f32]) -> Result<(), EmbeddingError> {
  if vector.len() != expected {
    return Err(EmbeddingError::DimensionMismatch { expected, actual: vector.len() });
  }
  Ok(())
}
