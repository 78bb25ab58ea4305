//! LanceDB implementation of the VectorDatabase trait

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;

use super::connection::{create_connection, open_connection};
use super::search::search_similar_documents;
use super::table_manager::TableManager;
use crate::models::{IndexEntry, Region, RetrievedDocument};
use crate::server::services::vector_database::VectorDatabase;

/// LanceDB implementation of the VectorDatabase trait
pub struct LanceDbVectorDatabase {
  table_manager: TableManager,
}

impl LanceDbVectorDatabase {
  /// Open an existing index for querying; a missing table is an error
  pub async fn open(data_dir: &Path, table_name: &str) -> Result<Self> {
    let connection = open_connection(data_dir).await?;
    let table_manager = TableManager::new(connection, table_name.to_string());

    if !table_manager.table_exists().await? {
      return Err(anyhow!(
        "Vector index table '{}' not found in {} - run `cyberintel ingest` first",
        table_name,
        data_dir.display()
      ));
    }

    Ok(Self { table_manager })
  }

  /// Open the index for ingestion, creating the directory if needed
  pub async fn open_or_create(data_dir: &Path, table_name: &str) -> Result<Self> {
    let connection = create_connection(data_dir).await?;
    Ok(Self { table_manager: TableManager::new(connection, table_name.to_string()) })
  }
}

#[async_trait]
impl VectorDatabase for LanceDbVectorDatabase {
  async fn upsert_entries(&self, entries: &[IndexEntry]) -> Result<()> {
    if entries.is_empty() {
      return Ok(());
    }

    if self.table_manager.table_exists().await? {
      self.table_manager.replace_entries(entries).await
    } else {
      self.table_manager.create_table_with_entries(entries).await
    }
  }

  async fn search_similar(
    &self,
    query_embedding: &[f32],
    limit: usize,
    region: Option<Region>,
  ) -> Result<Vec<RetrievedDocument>> {
    let table = self.table_manager.get_table().await?;
    search_similar_documents(&table, query_embedding, limit, region).await
  }

  async fn count_entries(&self) -> Result<usize> {
    self.table_manager.count_rows().await
  }

  async fn clear_all(&self) -> Result<()> {
    self.table_manager.clear().await
  }
}
