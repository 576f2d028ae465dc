use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while routing a query.
///
/// An `unmatched` decision is not an error; it is returned as
/// [`crate::RoutingDecision::Unmatched`].
#[derive(Debug, Error)]
pub enum RouterError {
  #[error("invalid topic catalog: {0}")]
  Configuration(#[from] CatalogError),

  #[error("query must contain non-whitespace text")]
  InvalidQuery,

  #[error("router has not been prepared; call prepare() before route()")]
  NotReady,

  #[error("embedding unavailable: {0}")]
  EmbeddingUnavailable(#[from] EmbeddingError),
}

/// Catalog definition problems, detected when the catalog is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
  #[error("catalog must define at least one topic")]
  Empty,

  #[error("topic names must not be blank")]
  BlankTopicName,

  #[error("topic '{0}' is defined more than once")]
  DuplicateTopic(String),

  #[error("topic '{0}' has no utterances")]
  EmptyTopic(String),

  #[error("topic '{topic}' has a blank utterance at position {position}")]
  BlankUtterance { topic: String, position: usize },
}

/// Failures reported by, or detected in the output of, an embedding provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
  #[error("embedding request timed out after {0:?}")]
  Timeout(Duration),

  #[error("embedding transport failed: {0}")]
  Transport(String),

  #[error("embedding provider returned status {status}: {message}")]
  Api { status: u16, message: String },

  #[error("malformed embedding response: {0}")]
  MalformedResponse(String),

  #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T, E = RouterError> = std::result::Result<T, E>;
