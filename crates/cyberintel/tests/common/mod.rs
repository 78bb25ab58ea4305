#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use cyberintel::models::{DocumentRecord, EntryMetadata, IndexEntry, Region};
use cyberintel::server::services::embeddings::Embedder;
use cyberintel::server::services::generation::Generator;

/// Every query lands on the origin, so an entry's distance is its squared norm
pub struct OriginEmbedder;

#[async_trait]
impl Embedder for OriginEmbedder {
  async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
    Ok(vec![0.0, 0.0])
  }

  fn dimension(&self) -> usize {
    2
  }
}

/// Two cheap text features: length and vowel count
pub struct TextStatsEmbedder;

#[async_trait]
impl Embedder for TextStatsEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let vowels = text.chars().filter(|c| "aeiouAEIOU".contains(*c)).count();
    Ok(vec![text.chars().count() as f32, vowels as f32])
  }

  fn dimension(&self) -> usize {
    2
  }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
  async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
    Err(anyhow!("embedding model unavailable"))
  }

  fn dimension(&self) -> usize {
    2
  }
}

/// Records every prompt and answers with a canned reply (or fails)
pub struct RecordingGenerator {
  pub prompts: Mutex<Vec<String>>,
  reply: Option<String>,
}

impl RecordingGenerator {
  pub fn replying(reply: &str) -> Self {
    Self { prompts: Mutex::new(Vec::new()), reply: Some(reply.to_string()) }
  }

  pub fn failing() -> Self {
    Self { prompts: Mutex::new(Vec::new()), reply: None }
  }

  pub fn calls(&self) -> usize {
    self.prompts.lock().unwrap().len()
  }

  pub fn last_prompt(&self) -> Option<String> {
    self.prompts.lock().unwrap().last().cloned()
  }
}

#[async_trait]
impl Generator for RecordingGenerator {
  async fn generate(&self, prompt: &str) -> Result<String> {
    self.prompts.lock().unwrap().push(prompt.to_string());
    self.reply.clone().ok_or_else(|| anyhow!("connection refused"))
  }

  fn name(&self) -> String {
    "recording".to_string()
  }
}

/// Index entry whose distance from the origin is exactly `distance`
pub fn entry_at(id: &str, region: Region, distance: f32) -> IndexEntry {
  IndexEntry {
    id: id.to_string(),
    metadata: EntryMetadata {
      region,
      source_url: format!("https://portal.example/{id}"),
      title: format!("Title {id}"),
      published_date: String::new(),
      scraped_at: "2025-01-01T00:00:00+00:00".to_string(),
    },
    document: format!("Title {id}\n\nGuidance text for {id}."),
    embedding: vec![distance.sqrt(), 0.0],
  }
}

pub fn record(region: Region, title: &str, content: &str) -> DocumentRecord {
  DocumentRecord {
    region,
    source_url: format!("https://portal.example/{}", title.to_lowercase().replace(' ', "-")),
    title: title.to_string(),
    content_block: content.to_string(),
    published_date: None,
    scraped_at: "2025-01-01T00:00:00+00:00".to_string(),
  }
}
