use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use router::{
  Aggregation, Catalog, CatalogError, EmbeddingClient, EmbeddingError, RouterEngine, RouterError,
  RouterSettings, RoutingDecision,
};

/// Embedder backed by a fixed lookup table; unknown text is an error.
struct TableEmbedder {
  vectors: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
  fn new(entries: &[(&str, Vec<f32>)]) -> Self {
    let vectors = entries.iter().map(|(text, vector)| (text.to_string(), vector.clone())).collect();
    Self { vectors }
  }
}

#[async_trait]
impl EmbeddingClient for TableEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    self
      .vectors
      .get(text)
      .cloned()
      .ok_or_else(|| EmbeddingError::MalformedResponse(format!("no vector for '{text}'")))
  }
}

const ENGINE_QUERY: &str = "what is the engine displacement";
const JOKE_QUERY: &str = "tell me a joke";

/// Unit vectors: ENGINE_QUERY has cosine 0.9 with "engine" and <= 0.1 with
/// every other utterance; JOKE_QUERY stays <= 0.05 with all of them.
fn cars_and_countries_embedder() -> TableEmbedder {
  TableEmbedder::new(&[
    ("car", vec![0.1, 0.0, 0.994_987_4, 0.0]),
    ("engine", vec![0.9, 0.435_889_9, 0.0, 0.0]),
    ("nation", vec![0.05, 0.0, 0.0, 0.998_749_2]),
    ("flag", vec![0.0, 0.0, 0.6, 0.8]),
    (ENGINE_QUERY, vec![1.0, 0.0, 0.0, 0.0]),
    (JOKE_QUERY, vec![0.05, -0.998_749_2, 0.0, 0.0]),
  ])
}

fn cars_and_countries() -> Catalog {
  Catalog::build([("cars", vec!["car", "engine"]), ("countries", vec!["nation", "flag"])]).unwrap()
}

fn settings(score_threshold: f32) -> RouterSettings {
  RouterSettings { score_threshold, ..RouterSettings::default() }
}

async fn engine_with(threshold: f32) -> RouterEngine {
  RouterEngine::prepared(
    cars_and_countries(),
    Arc::new(cars_and_countries_embedder()),
    settings(threshold),
  )
  .await
  .unwrap()
}

#[tokio::test]
async fn test_engine_question_routes_to_cars() {
  let engine = engine_with(0.16).await;

  let decision = engine.route(ENGINE_QUERY).await.unwrap();
  assert_eq!(decision.topic(), Some("cars"));
  match decision {
    RoutingDecision::Matched { score, .. } => assert!((score - 0.9).abs() < 1e-4),
    RoutingDecision::Unmatched => panic!("expected a match"),
  }
}

#[tokio::test]
async fn test_unrelated_question_is_unmatched() {
  let engine = engine_with(0.16).await;

  let decision = engine.route(JOKE_QUERY).await.unwrap();
  assert_eq!(decision, RoutingDecision::Unmatched);
  assert_eq!(decision.to_string(), "unmatched");
}

#[tokio::test]
async fn test_decision_is_always_a_known_topic_or_unmatched() {
  let engine = engine_with(0.16).await;
  let catalog = engine.catalog();

  for query in [ENGINE_QUERY, JOKE_QUERY, "car", "engine", "nation", "flag"] {
    match engine.route(query).await.unwrap() {
      RoutingDecision::Matched { topic, .. } => assert!(catalog.contains(&topic), "{topic}"),
      RoutingDecision::Unmatched => {}
    }
  }
}

#[tokio::test]
async fn test_routing_is_deterministic() {
  let engine = engine_with(0.16).await;
  let first = engine.route(ENGINE_QUERY).await.unwrap();

  for _ in 0..25 {
    assert_eq!(engine.route(ENGINE_QUERY).await.unwrap(), first);
  }
}

#[tokio::test]
async fn test_raising_threshold_only_removes_matches() {
  let mut previous_matched = true;
  for step in 0..=20 {
    let threshold = step as f32 * 0.05;
    let engine = engine_with(threshold).await;
    let matched = engine.route(ENGINE_QUERY).await.unwrap().is_matched();

    assert!(previous_matched || !matched, "threshold {threshold} turned unmatched into a match");
    previous_matched = matched;
  }
  assert!(!previous_matched);
}

#[tokio::test]
async fn test_tie_selects_lexicographically_first_topic() {
  // "beta" is defined first so insertion order cannot explain the result.
  let catalog =
    Catalog::build([("beta", vec!["same facet", "noise"]), ("alpha", vec!["same facet"])])
      .unwrap();
  let embedder = TableEmbedder::new(&[
    ("same facet", vec![0.6, 0.8]),
    ("noise", vec![-1.0, 0.0]),
    ("query", vec![0.8, 0.6]),
  ]);
  let engine =
    RouterEngine::prepared(catalog, Arc::new(embedder), settings(0.16)).await.unwrap();

  for _ in 0..10 {
    assert_eq!(engine.route("query").await.unwrap().topic(), Some("alpha"));
  }
}

#[tokio::test]
async fn test_tie_between_distinct_utterances_with_equal_vectors() {
  let catalog = Catalog::build([("zoo", vec!["lion"]), ("yard", vec!["tiger"])]).unwrap();
  let embedder = TableEmbedder::new(&[
    ("lion", vec![0.0, 1.0]),
    ("tiger", vec![0.0, 1.0]),
    ("big cats", vec![0.0, 2.0]),
  ]);
  let engine = RouterEngine::prepared(catalog, Arc::new(embedder), settings(0.5)).await.unwrap();

  assert_eq!(engine.route("big cats").await.unwrap().topic(), Some("yard"));
}

#[tokio::test]
async fn test_overlapping_facet_causes_false_positive_under_max() {
  // "horsepower" sits next to animal vocabulary in embedding space, so an
  // animal question matches the cars topic. Threshold tuning cannot move it
  // to countries; only curating the utterances can.
  let catalog = Catalog::build([
    ("cars", vec!["horsepower", "fuel consumption", "brake"]),
    ("countries", vec!["population", "fauna"]),
  ])
  .unwrap();
  let embedder = TableEmbedder::new(&[
    ("horsepower", vec![0.8, 0.6, 0.0]),
    ("fuel consumption", vec![0.0, 0.0, 1.0]),
    ("brake", vec![0.0, 0.1, 0.994_987_4]),
    ("population", vec![0.0, 1.0, 0.0]),
    ("fauna", vec![0.6, 0.8, 0.0]),
    ("which animals live in italy", vec![1.0, 0.0, 0.0]),
  ]);
  let embedder = Arc::new(embedder);

  for threshold in [0.0, 0.3, 0.6, 0.79] {
    let engine =
      RouterEngine::prepared(catalog.clone(), embedder.clone(), settings(threshold)).await.unwrap();
    let decision = engine.route("which animals live in italy").await.unwrap();
    assert_eq!(decision.topic(), Some("cars"), "threshold {threshold}");
  }

  let strict = RouterEngine::prepared(catalog.clone(), embedder.clone(), settings(0.81)).await;
  let decision = strict.unwrap().route("which animals live in italy").await.unwrap();
  assert_eq!(decision, RoutingDecision::Unmatched);

  let curated = Catalog::build([
    ("cars", vec!["fuel consumption", "brake"]),
    ("countries", vec!["population", "fauna"]),
  ])
  .unwrap();
  let engine = RouterEngine::prepared(curated, embedder, settings(0.16)).await.unwrap();
  assert_eq!(engine.route("which animals live in italy").await.unwrap().topic(), Some("countries"));
}

#[tokio::test]
async fn test_mean_aggregation_dilutes_single_facet() {
  let catalog = Catalog::build([
    ("cars", vec!["engine", "car", "flag"]),
    ("countries", vec!["nation"]),
  ])
  .unwrap();
  let settings = RouterSettings {
    score_threshold: 0.16,
    aggregation: Aggregation::Mean,
    ..RouterSettings::default()
  };
  let engine =
    RouterEngine::prepared(catalog, Arc::new(cars_and_countries_embedder()), settings)
      .await
      .unwrap();

  // max would give 0.9; the mean over three facets is (0.9 + 0.1 + 0.0) / 3.
  let scores = engine.scores(ENGINE_QUERY).await.unwrap();
  assert_eq!(scores[0].topic, "cars");
  assert!((scores[0].score - 1.0 / 3.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_concurrent_routes_share_one_engine() {
  let engine = Arc::new(engine_with(0.16).await);

  let handles: Vec<_> = (0..16)
    .map(|i| {
      let engine = engine.clone();
      tokio::spawn(async move {
        let query = if i % 2 == 0 { ENGINE_QUERY } else { JOKE_QUERY };
        (i, engine.route(query).await)
      })
    })
    .collect();

  for handle in handles {
    let (i, decision) = handle.await.unwrap();
    let decision = decision.unwrap();
    if i % 2 == 0 {
      assert_eq!(decision.topic(), Some("cars"));
    } else {
      assert_eq!(decision, RoutingDecision::Unmatched);
    }
  }
}

#[tokio::test]
async fn test_unknown_query_vector_surfaces_as_embedding_error() {
  let engine = engine_with(0.16).await;
  let result = engine.route("something the table does not know").await;
  assert!(matches!(result, Err(RouterError::EmbeddingUnavailable(_))));
}

#[test]
fn test_empty_catalog_rejected_at_build_time() {
  let entries: Vec<(&str, Vec<&str>)> = Vec::new();
  assert_eq!(Catalog::build(entries), Err(CatalogError::Empty));

  let error: RouterError = CatalogError::Empty.into();
  assert!(error.to_string().contains("at least one topic"));
}
