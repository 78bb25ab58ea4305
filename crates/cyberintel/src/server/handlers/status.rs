//! Root, status, version and schema endpoint handlers

use axum::{extract::State, response::Json};
use schemars::schema_for;
use uuid::Uuid;

use crate::server::state::AppState;
use crate::server::types::{
  ApiInfoResponse, ApiVersions, BaseResponse, QueryRequest, QueryResponse, RootResponse, SchemaResponse,
  StatusResponse, VersionResponse,
};

pub const ROOT_MESSAGE: &str = "Cyber Intelligence Chatbot API is running";

/// GET / - Liveness message
pub async fn root() -> Json<BaseResponse<RootResponse>> {
  Json(BaseResponse::success(RootResponse { message: ROOT_MESSAGE.to_string() }, Uuid::new_v4()))
}

/// GET /status - Pipeline readiness and index size
pub async fn status(State(state): State<AppState>) -> Json<BaseResponse<StatusResponse>> {
  let transaction_id = Uuid::new_v4();

  let response = match &state.pipeline {
    Some(pipeline) => {
      let indexed_documents = match pipeline.indexed_documents().await {
        Ok(count) => Some(count),
        Err(e) => {
          state.logger.warn(&format!("Failed to count indexed documents: {}", e), "status-api").await;
          None
        }
      };

      StatusResponse {
        status: "healthy".to_string(),
        pipeline_ready: true,
        indexed_documents,
        generator: pipeline.generator_name(),
        version: env!("CARGO_PKG_VERSION").to_string(),
      }
    }
    None => StatusResponse {
      status: "degraded".to_string(),
      pipeline_ready: false,
      indexed_documents: None,
      generator: None,
      version: env!("CARGO_PKG_VERSION").to_string(),
    },
  };

  Json(BaseResponse::success(response, transaction_id))
}

/// GET /version - Returns current API version
pub async fn version() -> Json<BaseResponse<VersionResponse>> {
  let transaction_id = Uuid::new_v4();
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };

  Json(BaseResponse::success(response, transaction_id))
}

/// GET /api - Returns API information and supported versions
pub async fn api_info() -> Json<BaseResponse<ApiInfoResponse>> {
  let transaction_id = Uuid::new_v4();
  let version = env!("CARGO_PKG_VERSION");
  let response = ApiInfoResponse {
    latest: version.to_string(),
    versions: ApiVersions { latest: version.to_string(), active: vec![version.to_string()] },
  };

  Json(BaseResponse::success(response, transaction_id))
}

/// GET /api/schema - JSON schemas of the query endpoint
pub async fn schema() -> Json<BaseResponse<SchemaResponse>> {
  let transaction_id = Uuid::new_v4();
  let response = SchemaResponse {
    query_request: serde_json::to_value(schema_for!(QueryRequest)).unwrap_or_default(),
    query_response: serde_json::to_value(schema_for!(QueryResponse)).unwrap_or_default(),
  };

  Json(BaseResponse::success(response, transaction_id))
}
