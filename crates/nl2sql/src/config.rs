//! Configuration file loading
//!
//! A config file is JSON or YAML (picked by extension). Every section is
//! optional; anything left out falls back to the built-in defaults, which
//! include the cars/countries topic catalog shipped in `config/topics.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use router::{Aggregation, CatalogConfig, OpenAiEmbeddingConfig, RouterSettings};
use serde::{Deserialize, Serialize};
use translator::ChatCompletionsConfig;

const DEFAULT_TOPICS: &str = include_str!("../config/topics.json");

/// File names looked up in the working directory, in order.
pub const LOCAL_CONFIG_FILES: [&str; 3] = ["nl2sql.json", "nl2sql.yaml", "nl2sql.yml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// `None` means the bundled catalog
  #[serde(skip_serializing_if = "Option::is_none")]
  pub topics: Option<CatalogConfig>,
  pub router: RouterConfig,
  pub embedding: EmbeddingConfig,
  pub llm: LlmConfig,
  pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
  pub score_threshold: f32,
  pub aggregation: Aggregation,
  /// `null` disables the timeout
  pub embed_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
  pub base_url: String,
  pub model: String,
  /// Name of the environment variable holding the API key
  pub api_key_env: String,
  pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  pub base_url: String,
  pub model: String,
  /// Name of the environment variable holding the API key
  pub api_key_env: String,
  pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  pub path: PathBuf,
  pub sample_rows: usize,
  /// Topic name -> table name
  pub tables: BTreeMap<String, String>,
}

impl Default for RouterConfig {
  fn default() -> Self {
    let settings = RouterSettings::default();
    Self {
      score_threshold: settings.score_threshold,
      aggregation: settings.aggregation,
      embed_timeout_ms: settings.embed_timeout.map(|limit| limit.as_millis() as u64),
    }
  }
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    let client = OpenAiEmbeddingConfig::default();
    Self {
      base_url: client.base_url,
      model: client.model,
      api_key_env: "OPENAI_API_KEY".to_string(),
      timeout_ms: client.timeout.as_millis() as u64,
    }
  }
}

impl Default for LlmConfig {
  fn default() -> Self {
    let client = ChatCompletionsConfig::default();
    Self {
      base_url: client.base_url,
      model: client.model,
      api_key_env: "OPENROUTER_API_KEY".to_string(),
      timeout_ms: client.timeout.as_millis() as u64,
    }
  }
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("data/data.db"),
      sample_rows: translator::schema::DEFAULT_SAMPLE_ROWS,
      tables: BTreeMap::from([
        ("cars".to_string(), "cars_data".to_string()),
        ("countries".to_string(), "countries_data".to_string()),
      ]),
    }
  }
}

/// The catalog bundled with the binary.
pub fn default_topics() -> Result<CatalogConfig> {
  parse_bundled_topics(DEFAULT_TOPICS)
}

fn parse_bundled_topics(content: &str) -> Result<CatalogConfig> {
  serde_json::from_str(content).context("bundled config/topics.json is not a valid topic catalog")
}

impl RouterConfig {
  pub fn settings(&self) -> RouterSettings {
    RouterSettings {
      score_threshold: self.score_threshold,
      aggregation: self.aggregation,
      embed_timeout: self.embed_timeout_ms.map(Duration::from_millis),
    }
  }
}

impl EmbeddingConfig {
  pub fn client_config(&self) -> OpenAiEmbeddingConfig {
    OpenAiEmbeddingConfig {
      base_url: self.base_url.clone(),
      model: self.model.clone(),
      api_key: api_key_from_env(&self.api_key_env),
      timeout: Duration::from_millis(self.timeout_ms),
    }
  }
}

impl LlmConfig {
  pub fn client_config(&self) -> ChatCompletionsConfig {
    ChatCompletionsConfig {
      base_url: self.base_url.clone(),
      model: self.model.clone(),
      api_key: api_key_from_env(&self.api_key_env),
      timeout: Duration::from_millis(self.timeout_ms),
    }
  }
}

fn api_key_from_env(name: &str) -> Option<String> {
  match std::env::var(name) {
    Ok(key) if !key.trim().is_empty() => Some(key),
    _ => {
      tracing::warn!(
        variable = name,
        "API key environment variable is not set; sending requests without credentials"
      );
      None
    }
  }
}

impl AppConfig {
  /// The configured topic catalog, or the bundled one when none is set.
  pub fn topics(&self) -> Result<CatalogConfig> {
    match &self.topics {
      Some(topics) => Ok(topics.clone()),
      None => default_topics(),
    }
  }

  /// Load configuration from a JSON or YAML file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
      Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
        .with_context(|| format!("invalid YAML in {}", path.display()))?,
      Some("json") | None => serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?,
      Some(other) => {
        return Err(anyhow!("unsupported config format '.{other}' for {}", path.display()))
      }
    };

    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
  }

  /// Load `explicit` if given, otherwise the first config found by
  /// [`discover`], otherwise the built-in defaults.
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    if let Some(path) = explicit {
      return Self::load_from_file(path);
    }

    let cwd = std::env::current_dir().context("failed to resolve the working directory")?;
    match discover(&cwd, dirs::config_dir().as_deref()) {
      Some(path) => Self::load_from_file(path),
      None => {
        tracing::debug!("no config file found, using built-in defaults");
        Ok(Self::default())
      }
    }
  }
}

/// Find the first existing config file: the local names in `cwd`, then
/// `<config_dir>/nl2sql/config.json`.
pub fn discover(cwd: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
  LOCAL_CONFIG_FILES
    .iter()
    .map(|name| cwd.join(name))
    .chain(config_dir.map(|dir| dir.join("nl2sql").join("config.json")))
    .find(|candidate| candidate.is_file())
}
