//! Answer generation through a locally hosted language model

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerationConfig;

/// Produces an answer from a fully rendered prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String>;

  /// Human-readable backend and model, for status output
  fn name(&self) -> String;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
  temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
  stream: bool,
  options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
  #[serde(default)]
  content: String,
}

/// Ollama `/api/chat` client
#[derive(Clone)]
pub struct OllamaGenerator {
  base_url: String,
  model: String,
  temperature: f32,
  client: Client,
}

impl OllamaGenerator {
  pub fn new(config: &GenerationConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      base_url: config.base_url.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      temperature: config.temperature,
      client,
    })
  }

  /// Whether the Ollama daemon answers at all
  pub async fn health_check(&self) -> bool {
    let url = format!("{}/api/tags", self.base_url);
    match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
      Ok(response) => response.status().is_success(),
      Err(_) => false,
    }
  }

  fn chat_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
      model: &self.model,
      messages: vec![ChatMessage { role: "user", content: prompt }],
      stream: false,
      options: ChatOptions { temperature: self.temperature },
    }
  }
}

#[async_trait]
impl Generator for OllamaGenerator {
  async fn generate(&self, prompt: &str) -> Result<String> {
    let url = format!("{}/api/chat", self.base_url);

    let response = self
      .client
      .post(&url)
      .json(&self.chat_body(prompt))
      .send()
      .await
      .map_err(|e| anyhow!("Ollama request failed: {}", e))?;

    if !response.status().is_success() {
      let status = response.status();
      let text = response.text().await.unwrap_or_default();
      return Err(anyhow!("Ollama chat error ({}): {}", status, text));
    }

    let payload: ChatResponse =
      response.json().await.map_err(|e| anyhow!("Invalid Ollama response: {}", e))?;

    let content = payload.message.map(|m| m.content).unwrap_or_default();
    if content.trim().is_empty() {
      return Err(anyhow!("Ollama returned an empty answer"));
    }
    Ok(content)
  }

  fn name(&self) -> String {
    format!("ollama:{}", self.model)
  }
}
