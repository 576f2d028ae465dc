//! Language model client
//!
//! [`LanguageModel`] is the seam the translator talks to.
//! [`ChatCompletionsClient`] implements it for OpenAI-compatible
//! `/chat/completions` endpoints such as OpenRouter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};

/// Sends a prompt, returns the model's text reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
  async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Configuration for the chat completions client
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
  /// Base URL of the API (e.g., "https://openrouter.ai/api/v1")
  pub base_url: String,
  pub model: String,
  pub api_key: Option<String>,
  pub timeout: Duration,
}

impl Default for ChatCompletionsConfig {
  fn default() -> Self {
    Self {
      base_url: "https://openrouter.ai/api/v1".to_string(),
      model: "meta-llama/llama-3.3-8b-instruct:free".to_string(),
      api_key: None,
      timeout: Duration::from_secs(60),
    }
  }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
  content: Option<String>,
}

pub struct ChatCompletionsClient {
  client: Client,
  config: ChatCompletionsConfig,
}

impl ChatCompletionsClient {
  pub fn new(config: ChatCompletionsConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| TranslateError::Transport(format!("failed to create HTTP client: {e}")))?;

    Ok(Self { client, config })
  }

  fn endpoint(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
  async fn complete(&self, prompt: &str) -> Result<String> {
    let body = ChatRequest {
      model: &self.config.model,
      messages: [ChatMessage { role: "user", content: prompt }],
    };

    let mut request = self.client.post(self.endpoint()).json(&body);
    if let Some(key) = &self.config.api_key {
      request = request.bearer_auth(key);
    }

    let response = request.send().await.map_err(|e| {
      if e.is_timeout() {
        TranslateError::Timeout(self.config.timeout)
      } else {
        TranslateError::Transport(e.to_string())
      }
    })?;

    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(TranslateError::Api { status: status.as_u16(), message });
    }

    let parsed: ChatResponse = response
      .json()
      .await
      .map_err(|e| TranslateError::MalformedResponse(format!("invalid response body: {e}")))?;

    first_reply(parsed)
  }
}

fn first_reply(response: ChatResponse) -> Result<String> {
  response
    .choices
    .into_iter()
    .next()
    .and_then(|choice| choice.message.content)
    .ok_or_else(|| TranslateError::MalformedResponse("response has no message content".to_string()))
}
