//! Vector database abstraction layer for document storage and retrieval
//!
//! This module provides a generic interface for vector database operations,
//! allowing different implementations (LanceDB, in-memory) to be swapped
//! without changing the query pipeline.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{IndexEntry, Region, RetrievedDocument};

/// Vector database interface for storing and searching document embeddings
#[async_trait]
pub trait VectorDatabase: Send + Sync {
  /// Insert entries, replacing any existing rows with the same id
  async fn upsert_entries(&self, entries: &[IndexEntry]) -> Result<()>;

  /// Nearest neighbours of `query_embedding`, ascending by squared L2 distance
  async fn search_similar(
    &self,
    query_embedding: &[f32],
    limit: usize,
    region: Option<Region>,
  ) -> Result<Vec<RetrievedDocument>>;

  /// Number of stored rows
  async fn count_entries(&self) -> Result<usize>;

  /// Remove every row
  async fn clear_all(&self) -> Result<()>;
}

/// Squared Euclidean distance, the metric both backends report
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Brute-force index kept in process memory
#[derive(Default)]
pub struct InMemoryVectorDatabase {
  entries: RwLock<HashMap<String, IndexEntry>>,
}

impl InMemoryVectorDatabase {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn with_entries(entries: &[IndexEntry]) -> Result<Self> {
    let db = Self::new();
    db.upsert_entries(entries).await?;
    Ok(db)
  }
}

#[async_trait]
impl VectorDatabase for InMemoryVectorDatabase {
  async fn upsert_entries(&self, entries: &[IndexEntry]) -> Result<()> {
    let Some(dimension) = batch_dimension(entries)? else {
      return Ok(());
    };

    let mut stored = self.entries.write().await;
    if let Some(expected) = stored_dimension(&stored) {
      if dimension != expected {
        return Err(anyhow!("Embedding dimension mismatch: index holds {}, batch has {}", expected, dimension));
      }
    }

    for entry in entries {
      stored.insert(entry.id.clone(), entry.clone());
    }
    Ok(())
  }

  async fn search_similar(
    &self,
    query_embedding: &[f32],
    limit: usize,
    region: Option<Region>,
  ) -> Result<Vec<RetrievedDocument>> {
    let stored = self.entries.read().await;
    if let Some(expected) = stored_dimension(&stored) {
      if query_embedding.len() != expected {
        return Err(anyhow!(
          "Query embedding has {} dimensions, index holds {}",
          query_embedding.len(),
          expected
        ));
      }
    }

    let mut hits: Vec<RetrievedDocument> = stored
      .values()
      .filter(|entry| region.is_none_or(|r| entry.metadata.region == r))
      .map(|entry| RetrievedDocument {
        id: entry.id.clone(),
        metadata: entry.metadata.clone(),
        document: entry.document.clone(),
        distance: squared_l2(query_embedding, &entry.embedding),
      })
      .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
    hits.truncate(limit);
    Ok(hits)
  }

  async fn count_entries(&self) -> Result<usize> {
    Ok(self.entries.read().await.len())
  }

  async fn clear_all(&self) -> Result<()> {
    self.entries.write().await.clear();
    Ok(())
  }
}

/// Shared embedding width of a batch; `None` for an empty batch
fn batch_dimension(entries: &[IndexEntry]) -> Result<Option<usize>> {
  let Some(first) = entries.first() else {
    return Ok(None);
  };
  let dimension = first.embedding.len();

  if let Some(bad) = entries.iter().find(|entry| entry.embedding.len() != dimension) {
    return Err(anyhow!(
      "Embedding dimension mismatch for '{}': expected {}, got {}",
      bad.id,
      dimension,
      bad.embedding.len()
    ));
  }
  Ok(Some(dimension))
}

fn stored_dimension(stored: &HashMap<String, IndexEntry>) -> Option<usize> {
  stored.values().next().map(|entry| entry.embedding.len())
}
