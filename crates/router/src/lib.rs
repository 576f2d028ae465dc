//! Router - Utterance-based semantic topic routing
//!
//! Embeds a catalog of example phrases per topic, compares each incoming
//! query against every phrase and resolves the scores into a single topic
//! decision (or `unmatched`). The embedding provider is injected through the
//! [`EmbeddingClient`] trait so the decision logic stays fully reproducible.

pub mod catalog;
pub mod decision;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod openai;
pub mod similarity;

pub use catalog::{Catalog, CatalogConfig, Topic};
pub use decision::{RoutingDecision, TopicScore};
pub use embedding::EmbeddingClient;
pub use engine::{RouterEngine, RouterSettings};
pub use error::{CatalogError, EmbeddingError, RouterError};
pub use openai::{OpenAiEmbeddingClient, OpenAiEmbeddingConfig};
pub use similarity::{cosine_similarity, Aggregation};
