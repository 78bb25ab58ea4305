//! Shared application state handed to every handler

use bentley::daemon_logs::DaemonLogs;
use std::sync::Arc;

use crate::rag::RagPipeline;

#[derive(Clone)]
pub struct AppState {
  /// `None` when the index or embedder failed to initialise
  pub pipeline: Option<Arc<RagPipeline>>,
  pub logger: Arc<DaemonLogs>,
}

impl AppState {
  pub fn new(pipeline: Option<Arc<RagPipeline>>, logger: Arc<DaemonLogs>) -> Self {
    Self { pipeline, logger }
  }
}
