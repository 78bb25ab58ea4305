//! Retrieval-augmented query pipeline
//!
//! Embed the question, pull the nearest documents (optionally within one
//! region), drop weak matches, and ask the generator to answer from what is
//! left. Degrades to showing the retrieved context when the generator is
//! missing or fails; only embedding and index failures surface as errors.

pub mod prompt;

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::models::{Region, SourceCitation};
use crate::server::services::embeddings::Embedder;
use crate::server::services::generation::Generator;
use crate::server::services::vector_database::VectorDatabase;

pub use prompt::{REFUSAL_MESSAGE, UNAVAILABLE_MARKER};

/// Answer text plus the sources its citation numbers refer to
#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
  pub answer: String,
  pub sources: Vec<SourceCitation>,
}

impl RagAnswer {
  fn refusal() -> Self {
    Self { answer: REFUSAL_MESSAGE.to_string(), sources: Vec::new() }
  }
}

pub struct RagPipeline {
  index: Arc<dyn VectorDatabase>,
  embedder: Arc<dyn Embedder>,
  generator: Option<Arc<dyn Generator>>,
  config: RetrievalConfig,
}

impl RagPipeline {
  pub fn new(
    index: Arc<dyn VectorDatabase>,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    config: RetrievalConfig,
  ) -> Self {
    Self { index, embedder, generator, config }
  }

  pub fn generator_name(&self) -> Option<String> {
    self.generator.as_ref().map(|generator| generator.name())
  }

  pub async fn indexed_documents(&self) -> Result<usize> {
    self.index.count_entries().await
  }

  pub async fn answer(&self, query_text: &str, region: Option<Region>) -> Result<RagAnswer> {
    let query_embedding = self.embedder.embed(query_text).await.context("Failed to embed query")?;
    if query_embedding.len() != self.embedder.dimension() {
      return Err(anyhow!(
        "Failed to embed query: expected {} dimensions, got {}",
        self.embedder.dimension(),
        query_embedding.len()
      ));
    }

    let mut candidates = self
      .index
      .search_similar(&query_embedding, self.config.top_k, region)
      .await
      .context("Vector search failed")?;

    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates.truncate(self.config.top_k);
    let retrieved = candidates.len();

    let relevant = prompt::filter_relevant(candidates, self.config.relevance_threshold);
    tracing::info!(
      region = region.map(|r| r.code()).unwrap_or("all"),
      retrieved,
      relevant = relevant.len(),
      threshold = self.config.relevance_threshold,
      "retrieval complete"
    );

    if relevant.is_empty() {
      return Ok(RagAnswer::refusal());
    }

    let sources: Vec<SourceCitation> = relevant.iter().map(SourceCitation::from).collect();
    let context = prompt::assemble_context(&relevant);

    let answer = match &self.generator {
      Some(generator) => {
        let rendered = prompt::build_prompt(&context, query_text, region);
        match generator.generate(&rendered).await {
          Ok(answer) => answer,
          Err(e) => {
            tracing::warn!(generator = %generator.name(), error = %e, "generation failed, returning context");
            prompt::generator_failed_answer(&context)
          }
        }
      }
      None => {
        tracing::info!("no generator configured, returning context");
        prompt::no_generator_answer(&context, self.config.fallback_chars)
      }
    };

    Ok(RagAnswer { answer, sources })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{EntryMetadata, IndexEntry};
  use crate::server::services::generation::MockGenerator;
  use crate::server::services::vector_database::InMemoryVectorDatabase;
  use async_trait::async_trait;

  /// Every query embeds to the origin, so distance is the squared norm of the entry
  struct OriginEmbedder;

  #[async_trait]
  impl Embedder for OriginEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
      Ok(vec![0.0, 0.0])
    }

    fn dimension(&self) -> usize {
      2
    }
  }

  struct FailingEmbedder;

  #[async_trait]
  impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
      Err(anyhow!("model not loaded"))
    }

    fn dimension(&self) -> usize {
      2
    }
  }

  /// Claims two dimensions but produces three
  struct MisreportingEmbedder;

  #[async_trait]
  impl Embedder for MisreportingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
      Ok(vec![0.0, 0.0, 0.0])
    }

    fn dimension(&self) -> usize {
      2
    }
  }

  fn entry(id: &str, region: Region, distance: f32) -> IndexEntry {
    IndexEntry {
      id: id.to_string(),
      metadata: EntryMetadata {
        region,
        source_url: format!("https://example.gov/{id}"),
        title: format!("Doc {id}"),
        published_date: String::new(),
        scraped_at: String::new(),
      },
      document: format!("Doc {id}\n\nBody of {id}"),
      embedding: vec![distance.sqrt(), 0.0],
    }
  }

  async fn pipeline_with(
    entries: &[IndexEntry],
    generator: Option<Arc<dyn Generator>>,
  ) -> RagPipeline {
    let index = InMemoryVectorDatabase::with_entries(entries).await.unwrap();
    RagPipeline::new(Arc::new(index), Arc::new(OriginEmbedder), generator, RetrievalConfig::default())
  }

  #[tokio::test]
  async fn test_generator_receives_grounded_prompt() -> Result<()> {
    let mut generator = MockGenerator::new();
    generator
      .expect_generate()
      .withf(|prompt: &str| {
        prompt.contains("[Source 1] Doc a") && prompt.contains("[Source 2] Doc b") && !prompt.contains("[Source 3]")
      })
      .times(1)
      .returning(|_| Ok("Use MFA [1] and patch [2].".to_string()));

    let pipeline = pipeline_with(
      &[entry("a", Region::Hk, 0.2), entry("b", Region::Hk, 0.5), entry("c", Region::Hk, 1.6)],
      Some(Arc::new(generator)),
    )
    .await;

    let result = pipeline.answer("How do I stay safe?", Some(Region::Hk)).await?;
    assert_eq!(result.answer, "Use MFA [1] and patch [2].");
    assert_eq!(result.sources.len(), 2);
    assert_eq!(result.sources[0].title, "Doc a");
    Ok(())
  }

  #[tokio::test]
  async fn test_generator_not_called_when_nothing_relevant() -> Result<()> {
    let mut generator = MockGenerator::new();
    generator.expect_generate().times(0);

    let pipeline = pipeline_with(&[entry("far", Region::Jp, 1.5)], Some(Arc::new(generator))).await;

    let result = pipeline.answer("anything", None).await?;
    assert_eq!(result.answer, REFUSAL_MESSAGE);
    assert!(result.sources.is_empty());
    Ok(())
  }

  #[tokio::test]
  async fn test_generator_failure_falls_back_to_context() -> Result<()> {
    let mut generator = MockGenerator::new();
    generator.expect_generate().returning(|_| Err(anyhow!("connection refused")));
    generator.expect_name().return_const("ollama:llama3.2".to_string());

    let pipeline = pipeline_with(&[entry("a", Region::Nyc, 0.3)], Some(Arc::new(generator))).await;

    let result = pipeline.answer("What is NYC3?", None).await?;
    assert!(result.answer.starts_with(UNAVAILABLE_MARKER));
    assert!(result.answer.contains("[Source 1] Doc a\nContent: Doc a\n\nBody of a"));
    assert_eq!(result.sources.len(), 1);
    Ok(())
  }

  #[tokio::test]
  async fn test_no_generator_answer() -> Result<()> {
    let pipeline = pipeline_with(&[entry("a", Region::Hk, 0.3)], None).await;

    let result = pipeline.answer("q", None).await?;
    assert!(result.answer.starts_with(UNAVAILABLE_MARKER));
    assert!(result.answer.contains("[Source 1] Doc a"));
    assert_eq!(pipeline.generator_name(), None);
    Ok(())
  }

  #[tokio::test]
  async fn test_embedding_failure_is_an_error() {
    let index = InMemoryVectorDatabase::new();
    let pipeline =
      RagPipeline::new(Arc::new(index), Arc::new(FailingEmbedder), None, RetrievalConfig::default());

    let err = pipeline.answer("q", None).await.unwrap_err();
    assert!(err.to_string().contains("Failed to embed query"));
  }

  #[tokio::test]
  async fn test_query_embedding_of_wrong_width_is_an_error() -> Result<()> {
    let index = InMemoryVectorDatabase::with_entries(&[entry("a", Region::Hk, 0.1)]).await?;
    let pipeline =
      RagPipeline::new(Arc::new(index), Arc::new(MisreportingEmbedder), None, RetrievalConfig::default());

    let err = pipeline.answer("q", None).await.unwrap_err();
    assert!(err.to_string().contains("expected 2 dimensions, got 3"));
    Ok(())
  }

  #[tokio::test]
  async fn test_custom_threshold_and_top_k() -> Result<()> {
    let index = InMemoryVectorDatabase::with_entries(&[
      entry("a", Region::Hk, 0.1),
      entry("b", Region::Hk, 0.4),
      entry("c", Region::Hk, 0.6),
    ])
    .await?;
    let config = RetrievalConfig { top_k: 2, relevance_threshold: 0.5, fallback_chars: 2000 };
    let pipeline = RagPipeline::new(Arc::new(index), Arc::new(OriginEmbedder), None, config);

    let result = pipeline.answer("q", None).await?;
    let titles: Vec<&str> = result.sources.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Doc a", "Doc b"]);
    Ok(())
  }
}
