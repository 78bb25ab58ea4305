use anyhow::{anyhow, Result};
use colored::*;
use std::path::Path;

use crate::cli::client::CyberIntelClient;
use crate::cli::display::{display_answer, display_region_breakdown};
use crate::config::IndexConfig;
use crate::crawler::{spiders, write_records, CrawlConfig, CrawlEngine};
use crate::ingest;
use crate::models::Region;

/// Crawl one portal, or all of them when `region` is `None`
#[cfg(not(tarpaulin_include))]
pub async fn crawl(region: Option<Region>, output_dir: &Path, config: CrawlConfig) -> Result<()> {
  let targets = match region {
    Some(region) => vec![spiders::spider_for(region)],
    None => spiders::all_spiders(),
  };
  let engine = CrawlEngine::new(config)?;
  let mut total = 0;

  for spider in targets {
    println!("{} Crawling {} ({})", "🕷".cyan(), spider.name().bold(), spider.region().display_name());

    let (records, report) = engine.crawl(spider.as_ref()).await?;
    let path = output_dir.join(spider.output_file());
    write_records(&path, &records)?;

    println!(
      "{} {} records from {} pages written to {}",
      "✓".green(),
      records.len(),
      report.pages_fetched,
      path.display().to_string().cyan()
    );
    for (url, error) in &report.errors {
      println!("  {} {} {}", "✗".red(), url, error.dimmed());
    }
    total += records.len();
  }

  bentley::announce!(&format!("Crawl finished: {total} records"));
  Ok(())
}

/// Load crawler output and push it into the vector index
pub async fn ingest(input_dir: &Path, batch_size: usize, reset: bool, index: &IndexConfig) -> Result<()> {
  let loaded = ingest::load_records(input_dir)?;

  for (path, count) in &loaded.files {
    println!("  {} {} ({} items)", "📄".yellow(), path.display(), count);
  }
  for (path, reason) in &loaded.skipped {
    println!("  {} {} skipped: {}", "✗".red(), path.display(), reason.dimmed());
  }

  if loaded.records.is_empty() {
    println!("No documents to ingest. Run `cyberintel crawl` first.");
    return Ok(());
  }

  let report = ingest_records(&loaded.records, batch_size, reset, index).await?;

  println!("{} Ingested {} documents into {}", "✓".green(), report.ingested, index.data_dir.display());
  display_region_breakdown(&report.by_region);
  Ok(())
}

#[cfg(feature = "ml-features")]
async fn ingest_records(
  records: &[crate::models::DocumentRecord],
  batch_size: usize,
  reset: bool,
  index: &IndexConfig,
) -> Result<ingest::IngestReport> {
  use crate::server::services::embeddings::OnnxEmbedder;
  use crate::server::services::lancedb::LanceDbVectorDatabase;
  use crate::server::services::vector_database::VectorDatabase;

  let db = LanceDbVectorDatabase::open_or_create(&index.data_dir, &index.table).await?;
  if reset {
    db.clear_all().await?;
    bentley::info!("Cleared existing index");
  }

  bentley::info!("Loading embedding model...");
  let embedder = OnnxEmbedder::load().await?;
  ingest::ingest(records, &embedder, &db, batch_size).await
}

#[cfg(not(feature = "ml-features"))]
async fn ingest_records(
  _records: &[crate::models::DocumentRecord],
  _batch_size: usize,
  _reset: bool,
  _index: &IndexConfig,
) -> Result<ingest::IngestReport> {
  Err(anyhow!("cyberintel was built without the ml-features feature; ingestion needs the embedding model"))
}

/// Ask the server a question
pub async fn ask(server: &str, terms: &[String], region: Option<&str>) -> Result<()> {
  let question = terms.join(" ");
  if question.trim().is_empty() {
    return Err(anyhow!("Please provide a question"));
  }

  let client = CyberIntelClient::new(server)?;
  let response = client.query(&question, region).await?;

  display_answer(&response.answer, &response.sources);
  Ok(())
}

pub async fn status(server: &str) -> Result<()> {
  let client = CyberIntelClient::new(server)?;
  let status = client.status().await?;

  let marker = if status.pipeline_ready { "●".green() } else { "●".red() };
  println!("{} {} (v{}) at {}", marker, status.status.bold(), status.version, client.base_url().cyan());
  match status.indexed_documents {
    Some(count) => println!("  Indexed documents: {count}"),
    None => println!("  Indexed documents: {}", "unknown".dimmed()),
  }
  println!("  Language model:    {}", status.generator.as_deref().unwrap_or("none (context only)"));
  Ok(())
}

/// Query server logs for debugging and monitoring
pub async fn logs(server: &str, limit: usize, level: &str) -> Result<()> {
  let client = CyberIntelClient::new(server)?;
  let logs = client.get_logs(limit, level).await?;

  if logs.is_empty() {
    println!("No logs found.");
    return Ok(());
  }

  for log in logs {
    let level_colored = match log.level.as_str() {
      "error" => log.level.red().bold(),
      "warn" => log.level.yellow().bold(),
      "info" => log.level.blue().bold(),
      "debug" => log.level.green(),
      "success" => log.level.bright_green().bold(),
      _ => log.level.normal(),
    };

    println!("{} [{}] {}", log.timestamp.to_string().cyan(), level_colored, log.message);

    let Some(context) = &log.context else {
      continue;
    };

    let mut context_parts = Vec::new();
    if let Some(request_id) = &context.request_id {
      context_parts.push(format!("request_id: {}", request_id.bright_blue()));
    }
    if let (Some(method), Some(path)) = (&context.method, &context.path) {
      context_parts.push(format!("request: {} {}", method.magenta().bold(), path.cyan()));
    }
    if let Some(status_code) = context.status_code {
      let status_color = match status_code {
        200..=299 => status_code.to_string().green(),
        300..=399 => status_code.to_string().yellow(),
        400..=499 => status_code.to_string().red(),
        _ => status_code.to_string().bright_red().bold(),
      };
      context_parts.push(format!("status: {status_color}"));
    }
    if let Some(duration) = context.duration_ms {
      context_parts.push(format!("duration: {duration:.2}ms"));
    }

    for part in &context_parts {
      println!("  {} {}", "└─".white().dimmed(), part);
    }
    if !context_parts.is_empty() {
      println!();
    }
  }

  Ok(())
}
