//! Document, index entry and citation types shared by the crawler, ingestion
//! and the query pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Jurisdiction a document was scraped from
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Region {
  #[serde(rename = "HK")]
  Hk,
  #[serde(rename = "JP")]
  Jp,
  #[serde(rename = "NYC")]
  Nyc,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown region '{0}' (expected one of HK, JP, NYC)")]
pub struct RegionParseError(pub String);

impl Region {
  pub const ALL: [Region; 3] = [Region::Hk, Region::Jp, Region::Nyc];

  /// Upper-case code used in ids, metadata and filters
  pub fn code(&self) -> &'static str {
    match self {
      Region::Hk => "HK",
      Region::Jp => "JP",
      Region::Nyc => "NYC",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      Region::Hk => "Hong Kong",
      Region::Jp => "Japan",
      Region::Nyc => "New York City",
    }
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for Region {
  type Err = RegionParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Region::ALL
      .into_iter()
      .find(|region| region.code().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| RegionParseError(s.to_string()))
  }
}

/// One scraped portal document, in the shape the crawler writes to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
  pub region: Region,
  pub source_url: String,
  pub title: String,
  pub content_block: String,
  #[serde(default)]
  pub published_date: Option<String>,
  pub scraped_at: String,
}

/// Metadata stored beside each vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
  pub region: Region,
  pub source_url: String,
  pub title: String,
  /// Empty when the portal did not publish a date
  pub published_date: String,
  pub scraped_at: String,
}

/// A record ready for embedding: id, metadata and the text that gets embedded
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDocument {
  pub id: String,
  pub metadata: EntryMetadata,
  pub document: String,
}

/// One row of the vector index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
  pub id: String,
  pub metadata: EntryMetadata,
  pub document: String,
  pub embedding: Vec<f32>,
}

/// A nearest-neighbour hit; lower distance means more similar
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
  pub id: String,
  pub metadata: EntryMetadata,
  pub document: String,
  pub distance: f32,
}

/// Citation returned to callers, numbered by position in the answer's source list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceCitation {
  pub title: String,
  pub url: String,
  pub region: Region,
}

impl PreparedDocument {
  /// Build the index row for the record at `position` in an ingestion batch
  pub fn from_record(position: usize, record: &DocumentRecord) -> Self {
    Self {
      id: format!("{}_{}", record.region, position),
      metadata: EntryMetadata {
        region: record.region,
        source_url: record.source_url.clone(),
        title: record.title.clone(),
        published_date: record.published_date.clone().unwrap_or_default(),
        scraped_at: record.scraped_at.clone(),
      },
      document: format!("{}\n\n{}", record.title, record.content_block),
    }
  }

  pub fn with_embedding(self, embedding: Vec<f32>) -> IndexEntry {
    IndexEntry { id: self.id, metadata: self.metadata, document: self.document, embedding }
  }
}

impl From<&RetrievedDocument> for SourceCitation {
  fn from(doc: &RetrievedDocument) -> Self {
    Self {
      title: doc.metadata.title.clone(),
      url: doc.metadata.source_url.clone(),
      region: doc.metadata.region,
    }
  }
}
