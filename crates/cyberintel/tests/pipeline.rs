mod common;

use anyhow::Result;
use std::sync::Arc;

use common::{entry_at, FailingEmbedder, OriginEmbedder, RecordingGenerator};
use cyberintel::config::RetrievalConfig;
use cyberintel::models::{IndexEntry, Region};
use cyberintel::rag::{RagPipeline, REFUSAL_MESSAGE, UNAVAILABLE_MARKER};
use cyberintel::server::services::generation::Generator;
use cyberintel::server::services::vector_database::InMemoryVectorDatabase;

async fn pipeline(entries: &[IndexEntry], generator: Option<Arc<dyn Generator>>) -> Result<RagPipeline> {
  let index = InMemoryVectorDatabase::with_entries(entries).await?;
  Ok(RagPipeline::new(Arc::new(index), Arc::new(OriginEmbedder), generator, RetrievalConfig::default()))
}

fn spread() -> Vec<IndexEntry> {
  [0.3, 0.8, 1.1, 1.3, 1.5]
    .iter()
    .enumerate()
    .map(|(i, d)| entry_at(&format!("HK_{i}"), Region::Hk, *d))
    .collect()
}

#[tokio::test]
async fn empty_index_refuses() -> Result<()> {
  let generator = Arc::new(RecordingGenerator::replying("should not be used"));
  let rag = pipeline(&[], Some(generator.clone())).await?;

  let result = rag.answer("How do I report phishing?", None).await?;

  assert_eq!(result.answer, REFUSAL_MESSAGE);
  assert!(result.sources.is_empty());
  assert_eq!(generator.calls(), 0);
  Ok(())
}

#[tokio::test]
async fn distant_candidates_refuse_like_empty_results() -> Result<()> {
  let generator = Arc::new(RecordingGenerator::replying("should not be used"));
  let rag = pipeline(
    &[entry_at("a", Region::Jp, 1.25), entry_at("b", Region::Jp, 1.9)],
    Some(generator.clone()),
  )
  .await?;

  let result = rag.answer("q", None).await?;

  assert_eq!(result.answer, REFUSAL_MESSAGE);
  assert!(result.sources.is_empty());
  assert_eq!(generator.calls(), 0);
  Ok(())
}

#[tokio::test]
async fn only_close_candidates_are_cited_in_distance_order() -> Result<()> {
  let generator = Arc::new(RecordingGenerator::replying("Back up data [1], patch [2], train staff [3]."));
  let rag = pipeline(&spread(), Some(generator.clone())).await?;

  let result = rag.answer("How do I defend against ransomware?", Some(Region::Hk)).await?;

  let titles: Vec<&str> = result.sources.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, vec!["Title HK_0", "Title HK_1", "Title HK_2"]);
  assert_eq!(result.answer, "Back up data [1], patch [2], train staff [3].");

  let prompt = generator.last_prompt().unwrap_or_default();
  for (k, id) in ["HK_0", "HK_1", "HK_2"].iter().enumerate() {
    assert!(prompt.contains(&format!("[Source {}] Title {}", k + 1, id)));
  }
  assert!(!prompt.contains("[Source 4]"));
  assert!(!prompt.contains("HK_3"));
  assert!(prompt.contains("for HK"));
  Ok(())
}

#[tokio::test]
async fn region_filter_excludes_other_regions() -> Result<()> {
  let rag = pipeline(
    &[
      entry_at("hk", Region::Hk, 0.5),
      entry_at("jp", Region::Jp, 0.1),
      entry_at("nyc", Region::Nyc, 0.2),
    ],
    Some(Arc::new(RecordingGenerator::replying("ok"))),
  )
  .await?;

  let filtered = rag.answer("q", Some(Region::Hk)).await?;
  assert_eq!(filtered.sources.len(), 1);
  assert_eq!(filtered.sources[0].region, Region::Hk);

  let unfiltered = rag.answer("q", None).await?;
  let regions: Vec<Region> = unfiltered.sources.iter().map(|s| s.region).collect();
  assert_eq!(regions, vec![Region::Jp, Region::Nyc, Region::Hk]);
  Ok(())
}

#[tokio::test]
async fn at_most_top_k_sources() -> Result<()> {
  let entries: Vec<IndexEntry> =
    (0..8).map(|i| entry_at(&format!("NYC_{i}"), Region::Nyc, 0.1 * (i as f32 + 1.0))).collect();
  let rag = pipeline(&entries, Some(Arc::new(RecordingGenerator::replying("ok")))).await?;

  let result = rag.answer("q", None).await?;
  assert_eq!(result.sources.len(), 5);
  assert_eq!(result.sources[0].title, "Title NYC_0");
  Ok(())
}

#[tokio::test]
async fn failing_generator_shows_full_context_and_keeps_sources() -> Result<()> {
  let generator = Arc::new(RecordingGenerator::failing());
  let rag = pipeline(&spread(), Some(generator.clone())).await?;

  let result = rag.answer("q", None).await?;

  assert!(result.answer.contains(UNAVAILABLE_MARKER));
  assert!(result.answer.contains("[Source 1] Title HK_0\nContent: Title HK_0\n\nGuidance text for HK_0."));
  assert!(result.answer.contains("[Source 3] Title HK_2"));
  assert_eq!(result.sources.len(), 3);
  assert_eq!(generator.calls(), 1);
  Ok(())
}

#[tokio::test]
async fn missing_generator_truncates_context_to_budget() -> Result<()> {
  let mut long = entry_at("long", Region::Jp, 0.2);
  long.document = format!("Title long\n\n{}", "情".repeat(3000));
  let index = InMemoryVectorDatabase::with_entries(&[long]).await?;
  let config = RetrievalConfig { fallback_chars: 100, ..Default::default() };
  let rag = RagPipeline::new(Arc::new(index), Arc::new(OriginEmbedder), None, config);

  let result = rag.answer("q", None).await?;

  assert!(result.answer.starts_with(UNAVAILABLE_MARKER));
  assert!(result.answer.ends_with("... (truncated)"));
  assert!(!result.answer.contains(&"情".repeat(200)));
  assert_eq!(result.sources.len(), 1);
  Ok(())
}

#[tokio::test]
async fn embedding_failure_is_an_error() -> Result<()> {
  let index = InMemoryVectorDatabase::with_entries(&spread()).await?;
  let rag = RagPipeline::new(Arc::new(index), Arc::new(FailingEmbedder), None, RetrievalConfig::default());

  assert!(rag.answer("q", None).await.is_err());
  Ok(())
}
