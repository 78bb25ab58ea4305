mod common;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use common::{record, TextStatsEmbedder};
use cyberintel::crawler::write_records;
use cyberintel::ingest::{build_entries, ingest, load_records};
use cyberintel::models::Region;
use cyberintel::server::services::embeddings::Embedder;
use cyberintel::server::services::vector_database::{InMemoryVectorDatabase, VectorDatabase};

fn write_fixture(dir: &TempDir) -> Result<()> {
  write_records(
    &dir.path().join("output.json"),
    &[
      record(Region::Hk, "Ransomware", "Back up your data regularly."),
      record(Region::Hk, "Phishing", "Do not click unknown links."),
    ],
  )?;
  write_records(
    &dir.path().join("output_japan.json"),
    &[record(Region::Jp, "Cybersecurity Strategy", "Document available at: https://www.nisc.go.jp/eng/x.pdf")],
  )?;
  std::fs::write(dir.path().join("output_nyc.json"), "{ not json")?;
  std::fs::write(dir.path().join("unrelated.json"), "[]")?;
  Ok(())
}

#[test]
fn loads_every_output_file_and_skips_broken_ones() -> Result<()> {
  let dir = TempDir::new()?;
  write_fixture(&dir)?;

  let loaded = load_records(dir.path())?;

  assert_eq!(loaded.records.len(), 3);
  assert_eq!(loaded.files.len(), 2);
  assert_eq!(loaded.skipped.len(), 1);
  assert!(loaded.skipped[0].0.ends_with("output_nyc.json"));
  Ok(())
}

#[test]
fn entries_follow_batch_position() -> Result<()> {
  let dir = TempDir::new()?;
  write_fixture(&dir)?;
  let loaded = load_records(dir.path())?;

  let entries = build_entries(&loaded.records);
  let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
  assert_eq!(ids, vec!["HK_0", "HK_1", "JP_2"]);
  assert_eq!(entries[0].document, "Ransomware\n\nBack up your data regularly.");
  assert_eq!(entries[2].metadata.published_date, "");
  Ok(())
}

#[tokio::test]
async fn ingest_reports_regions_and_is_idempotent() -> Result<()> {
  let dir = TempDir::new()?;
  write_fixture(&dir)?;
  let loaded = load_records(dir.path())?;
  let index = InMemoryVectorDatabase::new();

  let report = ingest(&loaded.records, &TextStatsEmbedder, &index, 2).await?;
  assert_eq!(report.ingested, 3);
  assert_eq!(report.by_region.get(&Region::Hk), Some(&2));
  assert_eq!(report.by_region.get(&Region::Jp), Some(&1));
  assert_eq!(report.by_region.get(&Region::Nyc), None);
  assert_eq!(index.count_entries().await?, 3);

  ingest(&loaded.records, &TextStatsEmbedder, &index, 2).await?;
  assert_eq!(index.count_entries().await?, 3);
  Ok(())
}

#[tokio::test]
async fn ingesting_nothing_is_not_an_error() -> Result<()> {
  let index = InMemoryVectorDatabase::new();
  let report = ingest(&[], &TextStatsEmbedder, &index, 8).await?;

  assert_eq!(report.ingested, 0);
  assert!(report.by_region.is_empty());
  assert_eq!(index.count_entries().await?, 0);
  Ok(())
}

/// Produces vectors one wider than it reports
struct OversizedEmbedder;

#[async_trait]
impl Embedder for OversizedEmbedder {
  async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
    Ok(vec![0.0, 0.0, 0.0])
  }

  fn dimension(&self) -> usize {
    2
  }
}

#[tokio::test]
async fn embeddings_of_the_wrong_width_are_not_stored() -> Result<()> {
  let index = InMemoryVectorDatabase::new();
  let records = [record(Region::Nyc, "NYC3", "Protects city systems.")];

  let err = ingest(&records, &OversizedEmbedder, &index, 8).await.unwrap_err();
  assert!(err.to_string().contains("3-dimension vector, expected 2"));
  assert_eq!(index.count_entries().await?, 0);
  Ok(())
}
