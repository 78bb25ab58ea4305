//! REST server startup and configuration

use anyhow::{anyhow, Result};
use axum::serve;
use bentley::daemon_logs::DaemonLogs;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{get_server_logs_path, AppConfig, GenerationConfig};
use crate::rag::RagPipeline;
use crate::server::routing::create_router;
use crate::server::services::generation::{Generator, OllamaGenerator};
use crate::server::state::AppState;

const COMPONENT: &str = "cyberintel-server";

/// Build the generator, or `None` when generation is disabled.
/// An unreachable Ollama is logged but still used; failed calls fall back per query.
pub async fn build_generator(config: &GenerationConfig, logger: &DaemonLogs) -> Result<Option<Arc<dyn Generator>>> {
  if !config.enabled {
    logger.info("Language model disabled; answers will show retrieved context", COMPONENT).await;
    return Ok(None);
  }

  let generator = OllamaGenerator::new(config)?;
  if generator.health_check().await {
    logger.info(&format!("Ollama reachable at {} (model {})", config.base_url, config.model), COMPONENT).await;
  } else {
    logger
      .warn(&format!("Ollama not reachable at {}; queries will fall back to retrieved context", config.base_url), COMPONENT)
      .await;
  }

  Ok(Some(Arc::new(generator)))
}

/// Open the index and load the embedding model
#[cfg(feature = "ml-features")]
pub async fn build_pipeline(config: &AppConfig, logger: &DaemonLogs) -> Result<RagPipeline> {
  use crate::server::services::embeddings::OnnxEmbedder;
  use crate::server::services::lancedb::LanceDbVectorDatabase;

  let index = LanceDbVectorDatabase::open(&config.index.data_dir, &config.index.table).await?;
  let embedder = OnnxEmbedder::load().await?;
  let generator = build_generator(&config.generation, logger).await?;

  Ok(RagPipeline::new(Arc::new(index), Arc::new(embedder), generator, config.retrieval.clone()))
}

#[cfg(not(feature = "ml-features"))]
pub async fn build_pipeline(_config: &AppConfig, _logger: &DaemonLogs) -> Result<RagPipeline> {
  Err(anyhow!("cyberintel was built without the ml-features feature; no embedder or vector index available"))
}

/// Start the REST server; a pipeline that fails to build leaves `/query` answering 500
#[cfg(not(tarpaulin_include))]
pub async fn start_server(addr: SocketAddr, config: AppConfig) -> Result<()> {
  let logs_path = get_server_logs_path();
  let daemon_logs = Arc::new(DaemonLogs::new(&logs_path)?);

  daemon_logs.info(&format!("Starting cyberintel REST server on {addr}"), COMPONENT).await;
  bentley::info!(&format!("Starting cyberintel REST server on {addr}"));

  let pipeline = match build_pipeline(&config, &daemon_logs).await {
    Ok(pipeline) => {
      daemon_logs.success("RAG pipeline initialized", COMPONENT).await;
      Some(Arc::new(pipeline))
    }
    Err(e) => {
      daemon_logs.error(&format!("Failed to initialize RAG pipeline: {:#}", e), COMPONENT).await;
      bentley::error!(&format!("Failed to initialize RAG pipeline: {:#}", e));
      None
    }
  };

  let state = AppState::new(pipeline, daemon_logs.clone());
  let app = create_router(state)
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()));

  let listener = TcpListener::bind(addr).await?;
  daemon_logs.info(&format!("Server listening on {addr}"), COMPONENT).await;
  bentley::info!(&format!("Server listening on {addr}"));

  match serve(listener, app).await {
    Ok(_) => {
      daemon_logs.info("Server shutdown gracefully", COMPONENT).await;
      Ok(())
    }
    Err(e) => {
      daemon_logs.error(&format!("Server error: {}", e), COMPONENT).await;
      Err(anyhow!("Server error: {}", e))
    }
  }
}
