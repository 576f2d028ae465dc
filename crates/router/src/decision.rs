//! Decision policy: ranking topic scores and applying the threshold.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// Label used when no topic clears the threshold.
pub const UNMATCHED: &str = "unmatched";

/// Aggregate similarity of one topic for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicScore {
  pub topic: String,
  pub score: f32,
}

impl TopicScore {
  /// `-0.0` is stored as `0.0` so equal scores always tie.
  pub fn new(topic: impl Into<String>, score: f32) -> Self {
    Self { topic: topic.into(), score: score + 0.0 }
  }
}

/// Outcome of routing one query: exactly one topic, or no topic.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
  Matched { topic: String, score: f32 },
  Unmatched,
}

impl RoutingDecision {
  /// The chosen topic name, `None` when unmatched.
  pub fn topic(&self) -> Option<&str> {
    match self {
      RoutingDecision::Matched { topic, .. } => Some(topic),
      RoutingDecision::Unmatched => None,
    }
  }

  pub fn is_matched(&self) -> bool {
    matches!(self, RoutingDecision::Matched { .. })
  }
}

impl fmt::Display for RoutingDecision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.topic().unwrap_or(UNMATCHED))
  }
}

/// Serialized as the topic name or `"unmatched"`.
impl Serialize for RoutingDecision {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.topic().unwrap_or(UNMATCHED))
  }
}

/// Decision order: higher score first, equal scores by topic name ascending.
pub fn decision_order(a: &TopicScore, b: &TopicScore) -> Ordering {
  // Adding 0.0 folds -0.0 into 0.0 for scores built without `new`.
  (b.score + 0.0).total_cmp(&(a.score + 0.0)).then_with(|| a.topic.cmp(&b.topic))
}

/// Sort scores into decision order.
pub fn rank(scores: &mut [TopicScore]) {
  scores.sort_by(decision_order);
}

/// Pick the winning topic, or `Unmatched` when the best score is strictly
/// below `threshold`. `scores` need not be sorted.
pub fn decide(scores: &[TopicScore], threshold: f32) -> RoutingDecision {
  let winner = scores.iter().min_by(|a, b| decision_order(a, b));

  match winner {
    Some(best) if best.score >= threshold => {
      RoutingDecision::Matched { topic: best.topic.clone(), score: best.score }
    }
    _ => RoutingDecision::Unmatched,
  }
}
