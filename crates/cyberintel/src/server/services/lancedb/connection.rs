//! Database connection management for LanceDB

use anyhow::{anyhow, Result};
use lancedb::{connect, Connection};
use std::path::Path;

/// Create a LanceDB connection, creating the data directory if needed
pub async fn create_connection(data_dir: &Path) -> Result<Connection> {
  std::fs::create_dir_all(data_dir)
    .map_err(|e| anyhow!("Failed to create data directory {}: {}", data_dir.display(), e))?;

  connect(&data_dir.to_string_lossy())
    .execute()
    .await
    .map_err(|e| anyhow!("Failed to connect to LanceDB: {}", e))
}

/// Connect to an existing index directory without creating anything
pub async fn open_connection(data_dir: &Path) -> Result<Connection> {
  if !data_dir.is_dir() {
    return Err(anyhow!("Vector index directory {} does not exist", data_dir.display()));
  }

  connect(&data_dir.to_string_lossy())
    .execute()
    .await
    .map_err(|e| anyhow!("Failed to connect to LanceDB: {}", e))
}
