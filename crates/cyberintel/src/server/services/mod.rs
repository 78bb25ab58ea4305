pub mod embeddings;
pub mod generation;
pub mod vector_database;

#[cfg(feature = "ml-features")]
pub mod lancedb;
