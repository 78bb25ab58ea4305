//! Runtime configuration
//!
//! Binaries take clap args (with environment fallbacks) and convert them into
//! the plain config structs below, which is all the library needs.

use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_TABLE: &str = "cyber_knowledge_base";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Root directory for index data and server logs (`~/.cyberintel`)
pub fn get_data_dir() -> PathBuf {
  dirs::home_dir().unwrap_or_else(std::env::temp_dir).join(".cyberintel")
}

/// Path of the JSONL server log
pub fn get_server_logs_path() -> PathBuf {
  get_data_dir().join("server.logs.jsonl")
}

// Plain configuration
// ===================

#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
  pub data_dir: PathBuf,
  pub table: String,
}

impl Default for IndexConfig {
  fn default() -> Self {
    Self { data_dir: get_data_dir().join("index"), table: DEFAULT_TABLE.to_string() }
  }
}

/// Retrieval-and-grounding knobs
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
  /// Candidates requested from the index
  pub top_k: usize,
  /// Candidates at or above this distance are discarded
  pub relevance_threshold: f32,
  /// Context budget (chars) when no generator is configured
  pub fallback_chars: usize,
}

impl Default for RetrievalConfig {
  fn default() -> Self {
    Self { top_k: 5, relevance_threshold: 1.2, fallback_chars: 2000 }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
  pub enabled: bool,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
  pub timeout_secs: u64,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      base_url: DEFAULT_OLLAMA_URL.to_string(),
      model: DEFAULT_MODEL.to_string(),
      temperature: 0.0,
      timeout_secs: 120,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
  pub index: IndexConfig,
  pub retrieval: RetrievalConfig,
  pub generation: GenerationConfig,
}

// Command-line arguments
// ======================

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
  /// Directory holding the vector index
  #[arg(long, env = "CYBERINTEL_DATA_DIR")]
  pub data_dir: Option<PathBuf>,

  /// Index table name
  #[arg(long, env = "CYBERINTEL_TABLE", default_value = DEFAULT_TABLE)]
  pub table: String,
}

#[derive(Args, Debug, Clone)]
pub struct RetrievalArgs {
  /// Number of nearest neighbours to retrieve
  #[arg(long, default_value_t = 5)]
  pub top_k: usize,

  /// Maximum embedding distance for a document to count as evidence
  #[arg(long, default_value_t = 1.2)]
  pub relevance_threshold: f32,

  /// Characters of context shown when no language model is configured
  #[arg(long, default_value_t = 2000)]
  pub fallback_chars: usize,
}

#[derive(Args, Debug, Clone)]
pub struct GenerationArgs {
  /// Ollama base URL
  #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_OLLAMA_URL)]
  pub ollama_url: String,

  /// Ollama model name
  #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_MODEL)]
  pub model: String,

  /// Sampling temperature
  #[arg(long, default_value_t = 0.0)]
  pub temperature: f32,

  /// Generation request timeout in seconds
  #[arg(long, default_value_t = 120)]
  pub timeout_secs: u64,

  /// Answer with retrieved context only, without a language model
  #[arg(long)]
  pub no_llm: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
  /// Base URL of the cyberintel server
  #[arg(long, env = "CYBERINTEL_SERVER", default_value = DEFAULT_SERVER_URL)]
  pub server: String,
}

impl From<&IndexArgs> for IndexConfig {
  fn from(args: &IndexArgs) -> Self {
    Self {
      data_dir: args.data_dir.clone().unwrap_or_else(|| IndexConfig::default().data_dir),
      table: args.table.clone(),
    }
  }
}

impl From<&RetrievalArgs> for RetrievalConfig {
  fn from(args: &RetrievalArgs) -> Self {
    Self {
      top_k: args.top_k,
      relevance_threshold: args.relevance_threshold,
      fallback_chars: args.fallback_chars,
    }
  }
}

impl From<&GenerationArgs> for GenerationConfig {
  fn from(args: &GenerationArgs) -> Self {
    Self {
      enabled: !args.no_llm,
      base_url: args.ollama_url.clone(),
      model: args.model.clone(),
      temperature: args.temperature,
      timeout_secs: args.timeout_secs,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Parser)]
  struct TestCli {
    #[command(flatten)]
    index: IndexArgs,
    #[command(flatten)]
    retrieval: RetrievalArgs,
    #[command(flatten)]
    generation: GenerationArgs,
  }

  #[test]
  fn test_retrieval_defaults() {
    let config = RetrievalConfig::default();
    assert_eq!(config.top_k, 5);
    assert_eq!(config.relevance_threshold, 1.2);
    assert_eq!(config.fallback_chars, 2000);
  }

  #[test]
  fn test_data_dir_lives_under_dot_directory() {
    assert!(get_data_dir().ends_with(".cyberintel"));
    assert!(get_server_logs_path().ends_with(".cyberintel/server.logs.jsonl"));
  }

  #[test]
  fn test_args_convert_to_config() {
    let cli = TestCli::parse_from([
      "test",
      "--data-dir",
      "/tmp/index",
      "--table",
      "policies",
      "--top-k",
      "3",
      "--relevance-threshold",
      "0.9",
      "--ollama-url",
      "http://ollama:11434",
      "--no-llm",
    ]);

    let index = IndexConfig::from(&cli.index);
    assert_eq!(index.data_dir, PathBuf::from("/tmp/index"));
    assert_eq!(index.table, "policies");

    let retrieval = RetrievalConfig::from(&cli.retrieval);
    assert_eq!(retrieval.top_k, 3);
    assert_eq!(retrieval.relevance_threshold, 0.9);
    assert_eq!(retrieval.fallback_chars, 2000);

    let generation = GenerationConfig::from(&cli.generation);
    assert!(!generation.enabled);
    assert_eq!(generation.base_url, "http://ollama:11434");
  }
}
