//! LanceDB service for vector similarity search
//!
//! This module provides integration with LanceDB for storing and searching
//! portal document embeddings by L2 distance.

pub mod connection;
pub mod records;
pub mod search;
pub mod table_manager;
pub mod vector_database;

pub use vector_database::LanceDbVectorDatabase;
