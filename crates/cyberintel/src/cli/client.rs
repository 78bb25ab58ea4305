//! HTTP client for the cyberintel REST API

use anyhow::{anyhow, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::DEFAULT_SERVER_URL;
use crate::server::types::{BaseResponse, LogEntry, LogsResponse, QueryRequest, QueryResponse, StatusResponse};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the server (e.g., "http://localhost:8000")
  pub base_url: String,
  /// Request timeout in seconds; answers wait on the language model
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { base_url: DEFAULT_SERVER_URL.to_string(), timeout_secs: 180 }
  }
}

pub struct CyberIntelClient {
  client: Client,
  config: ClientConfig,
}

impl CyberIntelClient {
  pub fn new(base_url: &str) -> Result<Self> {
    Self::with_config(ClientConfig { base_url: base_url.trim_end_matches('/').to_string(), ..Default::default() })
  }

  pub fn with_config(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  /// Ask a question, optionally restricted to one region code
  pub async fn query(&self, query: &str, region: Option<&str>) -> Result<QueryResponse> {
    let request = QueryRequest { query: query.to_string(), region: region.map(str::to_string) };

    let url = format!("{}/query", self.config.base_url);
    let response = self.client.post(&url).json(&request).send().await.map_err(|e| self.unreachable(e))?;

    let result: BaseResponse<QueryResponse> = decode(response, "Query failed").await?;
    Ok(result.data)
  }

  pub async fn status(&self) -> Result<StatusResponse> {
    let url = format!("{}/status", self.config.base_url);
    let response = self.client.get(&url).send().await.map_err(|e| self.unreachable(e))?;

    let result: BaseResponse<StatusResponse> = decode(response, "Failed to get status").await?;
    Ok(result.data)
  }

  pub async fn get_logs(&self, limit: usize, level: &str) -> Result<Vec<LogEntry>> {
    let url = format!("{}/logs", self.config.base_url);
    let response = self
      .client
      .get(&url)
      .query(&[("limit", limit.to_string()), ("level", level.to_string())])
      .send()
      .await
      .map_err(|e| self.unreachable(e))?;

    let result: BaseResponse<LogsResponse> = decode(response, "Failed to get logs").await?;
    Ok(result.data.logs)
  }

  fn unreachable(&self, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
      "Could not reach cyberintel server at {} ({}). Is cyberintel_server running?",
      self.config.base_url,
      error
    )
  }
}

/// Decode a success body, or surface the server's error message
async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    return Err(anyhow!("{}: {}", context, error_message(status.as_u16(), &body)));
  }

  response.json().await.map_err(|e| anyhow!("{}: invalid response body: {}", context, e))
}

/// First API error message in an error envelope, falling back to the raw body
pub fn error_message(status: u16, body: &str) -> String {
  serde_json::from_str::<BaseResponse<()>>(body)
    .ok()
    .and_then(|response| response.errors.into_iter().next())
    .map(|error| format!("{} ({})", error.message, error.key))
    .unwrap_or_else(|| format!("HTTP {status}: {body}"))
}
