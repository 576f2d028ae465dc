use serde::{Deserialize, Serialize};

/// Calculate cosine similarity between two embeddings
///
/// Vectors of different length, or with zero magnitude, score 0.0. The
/// engine checks dimensions before scoring, so the length guard only matters
/// to direct callers. Sums run in f64 so squares of large f32 components
/// cannot overflow; the result is clamped to [-1, 1] and never `-0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() {
    return 0.0;
  }

  let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
  let magnitude_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
  let magnitude_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

  if magnitude_a == 0.0 || magnitude_b == 0.0 {
    0.0
  } else {
    ((dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0) as f32) + 0.0
  }
}

/// How a topic's per-utterance similarities collapse into one topic score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
  /// Best single utterance. One strongly matching facet is enough.
  #[default]
  Max,
  /// Average over every utterance of the topic.
  Mean,
  /// Average of the `k` best utterances; `k` is clamped to `1..=len`.
  TopKMean(usize),
}

impl Aggregation {
  /// Collapse `scores` into one value. Returns `None` for an empty slice.
  pub fn aggregate(&self, scores: &[f32]) -> Option<f32> {
    if scores.is_empty() {
      return None;
    }

    match *self {
      Aggregation::Max => scores.iter().copied().reduce(f32::max),
      Aggregation::Mean => Some(mean(scores)),
      Aggregation::TopKMean(k) => {
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let k = k.clamp(1, sorted.len());
        Some(mean(&sorted[..k]))
      }
    }
  }
}

fn mean(scores: &[f32]) -> f32 {
  scores.iter().sum::<f32>() / scores.len() as f32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cosine_identical_vectors() {
    let v = [0.3, 0.4, 0.5];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_cosine_orthogonal_and_opposite() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_cosine_ignores_magnitude() {
    let similarity = cosine_similarity(&[1.0, 1.0], &[10.0, 10.0]);
    assert!((similarity - 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_cosine_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
  }

  #[test]
  fn test_cosine_large_components_stay_finite() {
    let big = [1e30_f32, 1e30];
    let similarity = cosine_similarity(&big, &big);
    assert!(similarity.is_finite());
    assert!((similarity - 1.0).abs() < 1e-6);

    let opposite = cosine_similarity(&[3e38, -3e38], &[-3e38, 3e38]);
    assert!((opposite + 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_cosine_orthogonal_is_positive_zero() {
    let similarity = cosine_similarity(&[1.0, -0.0], &[-0.0, 1.0]);
    assert_eq!(similarity, 0.0);
    assert!(similarity.is_sign_positive());
  }

  #[test]
  fn test_max_aggregation() {
    assert_eq!(Aggregation::Max.aggregate(&[0.1, 0.9, 0.4]), Some(0.9));
  }

  #[test]
  fn test_mean_aggregation() {
    let score = Aggregation::Mean.aggregate(&[0.2, 0.4, 0.6]).unwrap();
    assert!((score - 0.4).abs() < 1e-6);
  }

  #[test]
  fn test_top_k_mean_aggregation() {
    let score = Aggregation::TopKMean(2).aggregate(&[0.1, 0.9, 0.5]).unwrap();
    assert!((score - 0.7).abs() < 1e-6);
  }

  #[test]
  fn test_top_k_mean_clamps_k() {
    let all = Aggregation::TopKMean(10).aggregate(&[0.2, 0.4]).unwrap();
    assert!((all - 0.3).abs() < 1e-6);
    assert_eq!(Aggregation::TopKMean(0).aggregate(&[0.2, 0.4]), Some(0.4));
  }

  #[test]
  fn test_empty_scores() {
    assert_eq!(Aggregation::Max.aggregate(&[]), None);
    assert_eq!(Aggregation::Mean.aggregate(&[]), None);
  }

  #[test]
  fn test_aggregation_serde_shapes() {
    assert_eq!(serde_json::to_string(&Aggregation::Max).unwrap(), r#""max""#);
    let parsed: Aggregation = serde_json::from_str(r#"{"top_k_mean": 3}"#).unwrap();
    assert_eq!(parsed, Aggregation::TopKMean(3));
  }
}
