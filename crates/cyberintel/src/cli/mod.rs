//! Command-line front end: crawl and ingest run locally, questions go to the server

pub mod client;
pub mod commands;
pub mod display;
