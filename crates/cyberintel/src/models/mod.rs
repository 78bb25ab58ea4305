pub mod document;

pub use document::{
  DocumentRecord, EntryMetadata, IndexEntry, PreparedDocument, Region, RegionParseError,
  RetrievedDocument, SourceCitation,
};
