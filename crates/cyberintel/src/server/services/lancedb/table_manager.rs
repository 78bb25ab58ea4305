//! Table management operations for LanceDB

use anyhow::{anyhow, Result};
use arrow::record_batch::RecordBatchIterator;
use lancedb::{Connection, Table};

use super::records::entries_to_arrow_batch;
use crate::models::IndexEntry;

/// Table manager for LanceDB operations
pub struct TableManager {
  connection: Connection,
  table_name: String,
}

impl TableManager {
  pub fn new(connection: Connection, table_name: String) -> Self {
    Self { connection, table_name }
  }

  /// Check if the target table exists
  pub async fn table_exists(&self) -> Result<bool> {
    let tables = self
      .connection
      .table_names()
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to list tables: {}", e))?;
    Ok(tables.contains(&self.table_name))
  }

  /// Get the table instance
  pub async fn get_table(&self) -> Result<Table> {
    self
      .connection
      .open_table(&self.table_name)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to open table '{}': {}", self.table_name, e))
  }

  /// Create the table from its first batch of entries
  pub async fn create_table_with_entries(&self, entries: &[IndexEntry]) -> Result<()> {
    let batch = entries_to_arrow_batch(entries)?;
    let schema = batch.schema();
    let batch_iter = RecordBatchIterator::new(vec![Ok(batch)], schema);

    self
      .connection
      .create_table(&self.table_name, batch_iter)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to create table '{}': {}", self.table_name, e))?;

    bentley::info!(&format!("Created table '{}' with {} entries", self.table_name, entries.len()));
    Ok(())
  }

  /// Replace rows sharing an id with the given entries
  pub async fn replace_entries(&self, entries: &[IndexEntry]) -> Result<()> {
    let batch = entries_to_arrow_batch(entries)?;
    let schema = batch.schema();
    let batch_iter = RecordBatchIterator::new(vec![Ok(batch)], schema);

    let table = self.get_table().await?;
    table
      .delete(&id_predicate(entries))
      .await
      .map_err(|e| anyhow!("Failed to delete existing entries: {}", e))?;
    table
      .add(batch_iter)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to store entries: {}", e))?;

    tracing::debug!(table = %self.table_name, count = entries.len(), "stored entries");
    Ok(())
  }

  pub async fn count_rows(&self) -> Result<usize> {
    if !self.table_exists().await? {
      return Ok(0);
    }
    let table = self.get_table().await?;
    Ok(table.count_rows(None).await?)
  }

  pub async fn clear(&self) -> Result<()> {
    if self.table_exists().await? {
      let table = self.get_table().await?;
      table.delete("id IS NOT NULL").await?;
      bentley::info!(&format!("Cleared all entries from table '{}'", self.table_name));
    }
    Ok(())
  }
}

/// `id IN (...)` predicate with quotes escaped
pub fn id_predicate(entries: &[IndexEntry]) -> String {
  let ids: Vec<String> =
    entries.iter().map(|entry| format!("'{}'", entry.id.replace('\'', "''"))).collect();
  format!("id IN ({})", ids.join(", "))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{EntryMetadata, Region};

  fn entry(id: &str) -> IndexEntry {
    IndexEntry {
      id: id.to_string(),
      metadata: EntryMetadata {
        region: Region::Jp,
        source_url: String::new(),
        title: String::new(),
        published_date: String::new(),
        scraped_at: String::new(),
      },
      document: String::new(),
      embedding: vec![0.0],
    }
  }

  #[test]
  fn test_id_predicate() {
    assert_eq!(id_predicate(&[entry("JP_0"), entry("JP_1")]), "id IN ('JP_0', 'JP_1')");
    assert_eq!(id_predicate(&[entry("it's")]), "id IN ('it''s')");
  }
}
