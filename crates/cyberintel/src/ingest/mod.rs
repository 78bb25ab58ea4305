//! Load crawler output files and push them into the vector index

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::{DocumentRecord, PreparedDocument, Region};
use crate::server::services::embeddings::Embedder;
use crate::server::services::vector_database::VectorDatabase;

/// Records gathered from every `output*.json` file in a directory
#[derive(Debug, Default)]
pub struct LoadedRecords {
  pub records: Vec<DocumentRecord>,
  /// Files that loaded, with their record counts
  pub files: Vec<(PathBuf, usize)>,
  /// Files that were skipped, with the reason
  pub skipped: Vec<(PathBuf, String)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestReport {
  pub ingested: usize,
  pub by_region: BTreeMap<Region, usize>,
}

/// Crawler output files (`output*.json`) in `dir`, sorted by name
pub fn find_output_files(dir: &Path) -> Result<Vec<PathBuf>> {
  let entries = std::fs::read_dir(dir)
    .map_err(|e| anyhow!("Failed to read input directory {}: {}", dir.display(), e))?;

  let mut files: Vec<PathBuf> = entries
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|path| {
      path.is_file()
        && path
          .file_name()
          .and_then(|name| name.to_str())
          .is_some_and(|name| name.starts_with("output") && name.ends_with(".json"))
    })
    .collect();

  files.sort();
  Ok(files)
}

/// Read every output file; unreadable or undecodable files are skipped
pub fn load_records(dir: &Path) -> Result<LoadedRecords> {
  let mut loaded = LoadedRecords::default();

  for path in find_output_files(dir)? {
    match read_records(&path) {
      Ok(records) => {
        bentley::info!(&format!("Loaded {} items from {}", records.len(), path.display()));
        loaded.files.push((path, records.len()));
        loaded.records.extend(records);
      }
      Err(e) => {
        bentley::warn!(&format!("Skipping {}: {}", path.display(), e));
        loaded.skipped.push((path, e.to_string()));
      }
    }
  }

  Ok(loaded)
}

fn read_records(path: &Path) -> Result<Vec<DocumentRecord>> {
  let content = std::fs::read_to_string(path)?;
  let records: Vec<DocumentRecord> = serde_json::from_str(&content)?;
  Ok(records)
}

/// Ids, metadata and embedding text for a batch; ids follow batch position
pub fn build_entries(records: &[DocumentRecord]) -> Vec<PreparedDocument> {
  records.iter().enumerate().map(|(i, record)| PreparedDocument::from_record(i, record)).collect()
}

/// Embed and upsert `records` in chunks of `batch_size`
pub async fn ingest(
  records: &[DocumentRecord],
  embedder: &dyn Embedder,
  index: &dyn VectorDatabase,
  batch_size: usize,
) -> Result<IngestReport> {
  let mut report = IngestReport::default();
  if records.is_empty() {
    return Ok(report);
  }

  let prepared = build_entries(records);
  let total = prepared.len();

  for chunk in prepared.chunks(batch_size.max(1)) {
    let texts: Vec<String> = chunk.iter().map(|doc| doc.document.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != chunk.len() {
      return Err(anyhow!("Embedder returned {} vectors for {} documents", embeddings.len(), chunk.len()));
    }
    if let Some(bad) = embeddings.iter().find(|embedding| embedding.len() != embedder.dimension()) {
      return Err(anyhow!("Embedder returned a {}-dimension vector, expected {}", bad.len(), embedder.dimension()));
    }

    let entries: Vec<_> = chunk
      .iter()
      .cloned()
      .zip(embeddings)
      .map(|(doc, embedding)| doc.with_embedding(embedding))
      .collect();

    index.upsert_entries(&entries).await?;

    for entry in &entries {
      *report.by_region.entry(entry.metadata.region).or_insert(0) += 1;
    }
    report.ingested += entries.len();
    tracing::debug!(done = report.ingested, total, "ingested batch");
  }

  Ok(report)
}
