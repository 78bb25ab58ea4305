//! Cyber Intelligence REST Server
//!
//! Serves grounded answers over the indexed portal documents.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;

use cyberintel::config::{AppConfig, GenerationArgs, IndexArgs, RetrievalArgs};
use cyberintel::server::startup::start_server;

#[derive(Parser)]
#[command(name = "cyberintel_server")]
#[command(about = "Cyber Intelligence Chatbot REST API Server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
  /// Server bind address
  #[arg(long, default_value = "0.0.0.0:8000")]
  bind: SocketAddr,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,

  #[command(flatten)]
  index: IndexArgs,

  #[command(flatten)]
  retrieval: RetrievalArgs,

  #[command(flatten)]
  generation: GenerationArgs,
}

impl Args {
  fn app_config(&self) -> AppConfig {
    AppConfig {
      index: (&self.index).into(),
      retrieval: (&self.retrieval).into(),
      generation: (&self.generation).into(),
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  bentley::init_tracing("cyberintel", args.verbose);

  bentley::info!(&format!("Starting Cyber Intelligence REST Server v{}", env!("CARGO_PKG_VERSION")));
  bentley::info!(&format!("Binding to address: {}", args.bind));

  start_server(args.bind, args.app_config()).await
}
