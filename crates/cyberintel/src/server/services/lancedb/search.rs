//! Vector search operations and result processing for LanceDB

use anyhow::{anyhow, Result};
use arrow::array::{Array, Float32Array, StringArray};
use arrow::record_batch::RecordBatch;
use futures::stream::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use super::records::{DOCUMENT, ID, PUBLISHED_DATE, REGION, SCRAPED_AT, SOURCE_URL, TITLE};
use crate::models::{EntryMetadata, Region, RetrievedDocument};

/// Nearest neighbours by L2 distance, optionally restricted to one region
pub async fn search_similar_documents(
  table: &Table,
  query_embedding: &[f32],
  limit: usize,
  region: Option<Region>,
) -> Result<Vec<RetrievedDocument>> {
  let mut query = table
    .vector_search(query_embedding)?
    .column(super::records::EMBEDDING)
    .distance_type(DistanceType::L2)
    .limit(limit);

  if let Some(region) = region {
    query = query.only_if(region_filter(region));
  }

  let batches: Vec<RecordBatch> = query
    .execute()
    .await
    .map_err(|e| anyhow!("Vector search failed: {}", e))?
    .try_collect()
    .await
    .map_err(|e| anyhow!("Error reading search results: {}", e))?;

  let mut results = Vec::new();
  for batch in &batches {
    results.extend(process_result_batch(batch)?);
  }

  if results.is_empty() {
    bentley::verbose!("No similar documents found");
  }
  Ok(results)
}

/// SQL predicate for the region pre-filter
pub fn region_filter(region: Region) -> String {
  format!("{REGION} = '{}'", region.code())
}

/// Turn one result batch into retrieved documents
fn process_result_batch(batch: &RecordBatch) -> Result<Vec<RetrievedDocument>> {
  let ids = string_column(batch, ID)?;
  let regions = string_column(batch, REGION)?;
  let urls = string_column(batch, SOURCE_URL)?;
  let titles = string_column(batch, TITLE)?;
  let dates = string_column(batch, PUBLISHED_DATE)?;
  let scraped = string_column(batch, SCRAPED_AT)?;
  let documents = string_column(batch, DOCUMENT)?;
  let distances = distance_column(batch)?;

  let mut results = Vec::with_capacity(batch.num_rows());
  for row in 0..batch.num_rows() {
    let region: Region = regions.value(row).parse()?;
    results.push(RetrievedDocument {
      id: ids.value(row).to_string(),
      metadata: EntryMetadata {
        region,
        source_url: urls.value(row).to_string(),
        title: titles.value(row).to_string(),
        published_date: dates.value(row).to_string(),
        scraped_at: scraped.value(row).to_string(),
      },
      document: documents.value(row).to_string(),
      distance: distances.value(row),
    });
  }

  Ok(results)
}

fn string_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a StringArray> {
  batch
    .column_by_name(column_name)
    .ok_or_else(|| anyhow!("Missing '{}' column", column_name))?
    .as_any()
    .downcast_ref::<StringArray>()
    .ok_or_else(|| anyhow!("Failed to cast '{}' column to StringArray", column_name))
}

/// The `_distance` column LanceDB appends to vector search results
fn distance_column(batch: &RecordBatch) -> Result<&Float32Array> {
  let distances = batch
    .column_by_name("_distance")
    .ok_or_else(|| anyhow!("Missing '_distance' column"))?
    .as_any()
    .downcast_ref::<Float32Array>()
    .ok_or_else(|| anyhow!("Failed to cast '_distance' column to Float32Array"))?;

  if distances.null_count() > 0 {
    return Err(anyhow!("Search results contain rows without a distance"));
  }
  Ok(distances)
}
