//! Arrow RecordBatch conversion utilities for LanceDB

use anyhow::{anyhow, Result};
use arrow::array::{Array, FixedSizeListBuilder, Float32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::models::IndexEntry;

pub const ID: &str = "id";
pub const REGION: &str = "region";
pub const SOURCE_URL: &str = "source_url";
pub const TITLE: &str = "title";
pub const PUBLISHED_DATE: &str = "published_date";
pub const SCRAPED_AT: &str = "scraped_at";
pub const DOCUMENT: &str = "document";
pub const EMBEDDING: &str = "embedding";

/// Text columns in schema order
const TEXT_COLUMNS: [&str; 7] = [ID, REGION, SOURCE_URL, TITLE, PUBLISHED_DATE, SCRAPED_AT, DOCUMENT];

/// Arrow schema for index rows of the given embedding width
pub fn index_schema(embedding_dimension: usize) -> Arc<Schema> {
  let mut fields: Vec<Field> =
    TEXT_COLUMNS.iter().map(|name| Field::new(*name, DataType::Utf8, false)).collect();

  fields.push(Field::new(
    EMBEDDING,
    DataType::FixedSizeList(
      Arc::new(Field::new("item", DataType::Float32, true)),
      embedding_dimension as i32,
    ),
    false,
  ));

  Arc::new(Schema::new(fields))
}

/// Convert index entries to a single Arrow RecordBatch
pub fn entries_to_arrow_batch(entries: &[IndexEntry]) -> Result<RecordBatch> {
  let dimension = validate_entries(entries)?;
  let schema = index_schema(dimension);

  let mut columns: Vec<Arc<dyn Array>> =
    TEXT_COLUMNS.iter().map(|name| text_column(entries, name)).collect();
  columns.push(Arc::new(embedding_column(entries, dimension)));

  RecordBatch::try_new(schema, columns).map_err(|e| anyhow!("Failed to create RecordBatch: {}", e))
}

/// Entries must be non-empty and share one embedding width
fn validate_entries(entries: &[IndexEntry]) -> Result<usize> {
  let first = entries.first().ok_or_else(|| anyhow!("Cannot create RecordBatch from empty entries"))?;
  let dimension = first.embedding.len();

  if dimension == 0 {
    return Err(anyhow!("Entry '{}' has an empty embedding", first.id));
  }

  if let Some(bad) = entries.iter().find(|entry| entry.embedding.len() != dimension) {
    return Err(anyhow!(
      "Embedding dimension mismatch for '{}': expected {}, got {}",
      bad.id,
      dimension,
      bad.embedding.len()
    ));
  }

  Ok(dimension)
}

fn text_value<'a>(entry: &'a IndexEntry, column: &str) -> &'a str {
  match column {
    ID => &entry.id,
    REGION => entry.metadata.region.code(),
    SOURCE_URL => &entry.metadata.source_url,
    TITLE => &entry.metadata.title,
    PUBLISHED_DATE => &entry.metadata.published_date,
    SCRAPED_AT => &entry.metadata.scraped_at,
    _ => &entry.document,
  }
}

fn text_column(entries: &[IndexEntry], column: &str) -> Arc<dyn Array> {
  let values: Vec<&str> = entries.iter().map(|entry| text_value(entry, column)).collect();
  Arc::new(StringArray::from(values))
}

fn embedding_column(entries: &[IndexEntry], dimension: usize) -> arrow::array::FixedSizeListArray {
  let mut builder = FixedSizeListBuilder::new(
    Float32Array::builder(dimension * entries.len()),
    dimension as i32,
  );

  for entry in entries {
    builder.values().append_slice(&entry.embedding);
    builder.append(true);
  }

  builder.finish()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{EntryMetadata, Region};

  fn entry(id: &str, embedding: Vec<f32>) -> IndexEntry {
    IndexEntry {
      id: id.to_string(),
      metadata: EntryMetadata {
        region: Region::Nyc,
        source_url: "https://www.nyc.gov/site/cyber".to_string(),
        title: "NYC Cyber Command".to_string(),
        published_date: String::new(),
        scraped_at: "2025-01-01T00:00:00Z".to_string(),
      },
      document: "NYC Cyber Command\n\nProtects city systems.".to_string(),
      embedding,
    }
  }

  #[test]
  fn test_batch_has_expected_columns() -> Result<()> {
    let batch = entries_to_arrow_batch(&[entry("NYC_0", vec![0.1, 0.2]), entry("NYC_1", vec![0.3, 0.4])])?;

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 8);

    let regions = batch
      .column_by_name(REGION)
      .and_then(|col| col.as_any().downcast_ref::<StringArray>())
      .unwrap();
    assert_eq!(regions.value(0), "NYC");

    let documents = batch
      .column_by_name(DOCUMENT)
      .and_then(|col| col.as_any().downcast_ref::<StringArray>())
      .unwrap();
    assert!(documents.value(1).starts_with("NYC Cyber Command\n\n"));
    Ok(())
  }

  #[test]
  fn test_empty_entries_rejected() {
    assert!(entries_to_arrow_batch(&[]).is_err());
  }

  #[test]
  fn test_mixed_dimensions_rejected() {
    let result = entries_to_arrow_batch(&[entry("NYC_0", vec![0.1, 0.2]), entry("NYC_1", vec![0.3])]);
    assert!(result.is_err());
  }
}
