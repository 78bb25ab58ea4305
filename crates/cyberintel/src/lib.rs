//! Cyber Intel - Policy Q&A over government cybersecurity portals
//!
//! Crawls the Hong Kong, Japan and New York City cybersecurity portals, indexes
//! the scraped documents as sentence embeddings, and answers questions with a
//! retrieval-augmented pipeline that only speaks from what it retrieved.

pub mod cli;
pub mod config;
pub mod crawler;
pub mod ingest;
pub mod models;
pub mod rag;
pub mod server;
