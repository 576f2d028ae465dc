//! Topic catalog: the static set of named topics and their utterances.
//!
//! A [`Catalog`] is validated once at build time and is read-only afterwards.
//! Changing utterances means building a new catalog (and a new engine).

use std::collections::HashSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CatalogError;

/// A named category with an ordered, non-empty list of example phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
  name: String,
  utterances: Vec<String>,
}

impl Topic {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn utterances(&self) -> &[String] {
    &self.utterances
  }
}

/// Validated, immutable registry of topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
  topics: Vec<Topic>,
}

impl Catalog {
  /// Build a catalog from `(topic name, utterances)` pairs.
  ///
  /// Topic names are case-sensitive and must be unique and non-blank; every
  /// topic needs at least one non-blank utterance. Utterances may repeat
  /// across topics.
  pub fn build<I, N, U>(entries: I) -> Result<Self, CatalogError>
  where
    I: IntoIterator<Item = (N, Vec<U>)>,
    N: Into<String>,
    U: Into<String>,
  {
    let mut seen = HashSet::new();
    let mut topics = Vec::new();

    for (name, utterances) in entries {
      let name = name.into();
      if name.trim().is_empty() {
        return Err(CatalogError::BlankTopicName);
      }
      if !seen.insert(name.clone()) {
        return Err(CatalogError::DuplicateTopic(name));
      }

      let utterances: Vec<String> = utterances.into_iter().map(Into::into).collect();
      if utterances.is_empty() {
        return Err(CatalogError::EmptyTopic(name));
      }
      if let Some(position) = utterances.iter().position(|u| u.trim().is_empty()) {
        return Err(CatalogError::BlankUtterance { topic: name, position });
      }

      topics.push(Topic { name, utterances });
    }

    if topics.is_empty() {
      return Err(CatalogError::Empty);
    }

    Ok(Self { topics })
  }

  /// Build a catalog from its configuration form.
  pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
    Self::build(config.entries.iter().map(|(name, utterances)| (name.as_str(), utterances.clone())))
  }

  /// Topics in definition order.
  pub fn topics(&self) -> &[Topic] {
    &self.topics
  }

  pub fn get(&self, name: &str) -> Option<&Topic> {
    self.topics.iter().find(|topic| topic.name == name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  pub fn len(&self) -> usize {
    self.topics.len()
  }

  pub fn is_empty(&self) -> bool {
    self.topics.is_empty()
  }

  /// Total number of utterances across all topics.
  pub fn utterance_count(&self) -> usize {
    self.topics.iter().map(|topic| topic.utterances.len()).sum()
  }
}

/// Unvalidated catalog definition, shaped `{ topic_name: [utterance, ...] }`.
///
/// Entries keep file order and duplicate keys are preserved so that
/// [`Catalog::from_config`] can reject them instead of silently keeping the
/// last definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogConfig {
  entries: Vec<(String, Vec<String>)>,
}

impl CatalogConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a topic definition.
  pub fn with_topic<N, U>(mut self, name: N, utterances: impl IntoIterator<Item = U>) -> Self
  where
    N: Into<String>,
    U: Into<String>,
  {
    self.entries.push((name.into(), utterances.into_iter().map(Into::into).collect()));
    self
  }

  pub fn entries(&self) -> &[(String, Vec<String>)] {
    &self.entries
  }
}

impl Serialize for CatalogConfig {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (name, utterances) in &self.entries {
      map.serialize_entry(name, utterances)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for CatalogConfig {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
      type Value = CatalogConfig;

      fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of topic names to lists of utterances")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, utterances)) = access.next_entry::<String, Vec<String>>()? {
          entries.push((name, utterances));
        }
        Ok(CatalogConfig { entries })
      }
    }

    deserializer.deserialize_map(EntriesVisitor)
  }
}
