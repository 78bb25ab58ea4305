use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use cyberintel::cli::commands;
use cyberintel::config::{ClientArgs, IndexArgs, IndexConfig};
use cyberintel::crawler::CrawlConfig;
use cyberintel::models::Region;

#[derive(Parser)]
#[command(name = "cyberintel")]
#[command(
  about = "Cyber Intelligence - grounded answers from government cybersecurity portals\nCrawl HK, JP and NYC portals, index them, and ask questions"
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CrawlTarget {
  Hk,
  Jp,
  Nyc,
  All,
}

impl CrawlTarget {
  fn region(self) -> Option<Region> {
    match self {
      CrawlTarget::Hk => Some(Region::Hk),
      CrawlTarget::Jp => Some(Region::Jp),
      CrawlTarget::Nyc => Some(Region::Nyc),
      CrawlTarget::All => None,
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Scrape a government portal into output*.json files
  Crawl {
    /// Portal to crawl
    #[arg(value_enum, default_value = "all")]
    target: CrawlTarget,
    /// Directory the output files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Maximum pages fetched per portal
    #[arg(long, default_value_t = 200)]
    max_pages: usize,
    /// Delay between requests in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
  },
  /// Embed crawler output and store it in the vector index
  Ingest {
    /// Directory containing output*.json files
    #[arg(long, default_value = ".")]
    input_dir: PathBuf,
    /// Documents embedded per batch
    #[arg(long, default_value_t = 32)]
    batch_size: usize,
    /// Clear the index before ingesting
    #[arg(long)]
    reset: bool,
    #[command(flatten)]
    index: IndexArgs,
  },
  /// Ask a question of the running server
  Ask {
    /// Question (space-separated words are joined)
    #[arg(required = true)]
    terms: Vec<String>,
    /// Restrict to one region (HK, JP, NYC)
    #[arg(short, long)]
    region: Option<String>,
    #[command(flatten)]
    client: ClientArgs,
  },
  /// Show server readiness and index size
  Status {
    #[command(flatten)]
    client: ClientArgs,
  },
  /// Query server logs for debugging and monitoring
  Logs {
    /// Maximum number of log entries to return
    #[arg(short, long, default_value = "50")]
    limit: usize,
    /// Filter by log level (info, warn, error, success, all)
    #[arg(long, default_value = "all")]
    level: String,
    #[command(flatten)]
    client: ClientArgs,
  },
}

async fn handle(command: Command) -> Result<()> {
  match command {
    Command::Crawl { target, output_dir, max_pages, delay_ms } => {
      let config = CrawlConfig { max_pages, delay_ms, ..Default::default() };
      commands::crawl(target.region(), &output_dir, config).await
    }
    Command::Ingest { input_dir, batch_size, reset, index } => {
      commands::ingest(&input_dir, batch_size, reset, &IndexConfig::from(&index)).await
    }
    Command::Ask { terms, region, client } => commands::ask(&client.server, &terms, region.as_deref()).await,
    Command::Status { client } => commands::status(&client.server).await,
    Command::Logs { limit, level, client } => commands::logs(&client.server, limit, &level).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  bentley::init_tracing("cyberintel", cli.verbose);

  handle(cli.command).await
}
