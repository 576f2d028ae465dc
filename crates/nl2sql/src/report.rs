//! Evaluation harness: route a labelled query set and score the result.

use std::path::Path;

use anyhow::{Context, Result};
use router::{RouterEngine, RoutingDecision};
use serde::{Deserialize, Serialize};

/// One labelled query from the evaluation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationQuery {
  pub query: String,
  /// Expected topic, or `unmatched`
  pub category: String,
}

/// `route` serializes as the topic name or `"unmatched"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
  pub query: String,
  pub category: String,
  pub route: RoutingDecision,
}

impl ReportEntry {
  pub fn is_correct(&self) -> bool {
    self.route.to_string() == self.category
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accuracy {
  pub correct: usize,
  pub total: usize,
}

impl Accuracy {
  pub fn of(entries: &[ReportEntry]) -> Self {
    let correct = entries.iter().filter(|entry| entry.is_correct()).count();
    Self { correct, total: entries.len() }
  }

  /// Fraction of correct routes; 0 for an empty run.
  pub fn ratio(&self) -> f64 {
    if self.total == 0 {
      0.0
    } else {
      self.correct as f64 / self.total as f64
    }
  }
}

pub fn read_queries(path: &Path) -> Result<Vec<EvaluationQuery>> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read queries from {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("{} is not a JSON array of {{query, category}}", path.display()))
}

pub fn write_report(path: &Path, entries: &[ReportEntry]) -> Result<()> {
  let content = serde_json::to_string_pretty(entries)?;
  std::fs::write(path, content)
    .with_context(|| format!("failed to write report to {}", path.display()))
}

/// Route every query in order, calling `on_routed` with the 1-based position
/// of each finished entry. The first routing error aborts the run.
pub async fn evaluate<F>(
  engine: &RouterEngine,
  queries: &[EvaluationQuery],
  mut on_routed: F,
) -> Result<Vec<ReportEntry>>
where
  F: FnMut(usize, &ReportEntry),
{
  let mut entries = Vec::with_capacity(queries.len());

  for (index, item) in queries.iter().enumerate() {
    let position = index + 1;
    let route = engine
      .route(&item.query)
      .await
      .with_context(|| format!("failed to route query #{position} ({:?})", item.query))?;
    tracing::debug!(query = %item.query, %route, expected = %item.category, "evaluated query");

    let entry =
      ReportEntry { query: item.query.clone(), category: item.category.clone(), route };
    on_routed(position, &entry);
    entries.push(entry);
  }

  Ok(entries)
}
