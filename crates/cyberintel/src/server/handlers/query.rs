//! Question answering endpoint

use axum::{
  extract::{Extension, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use uuid::Uuid;

use crate::models::{Region, RegionParseError};
use crate::server::middleware::RequestContext;
use crate::server::state::AppState;
use crate::server::types::{ApiError, BaseResponse, QueryRequest, QueryResponse};

type ErrorResponse = (StatusCode, ResponseJson<BaseResponse<()>>);

/// Omitted or blank region means every region
pub fn parse_region(region: Option<&str>) -> Result<Option<Region>, RegionParseError> {
  match region.map(str::trim) {
    None | Some("") => Ok(None),
    Some(code) => code.parse().map(Some),
  }
}

fn error_response(status: StatusCode, key: &str, message: &str, transaction_id: Uuid) -> ErrorResponse {
  let error = ApiError::new(key, message);
  (status, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

/// POST /query - Answer a question from the indexed portal documents
pub async fn query(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<QueryRequest>,
) -> Result<ResponseJson<BaseResponse<QueryResponse>>, ErrorResponse> {
  let transaction_id = Uuid::new_v4();

  let Some(pipeline) = state.pipeline.as_ref() else {
    context.log_error("Query received but RAG pipeline is not initialized", "query-api").await;
    return Err(error_response(
      StatusCode::INTERNAL_SERVER_ERROR,
      "pipeline_not_initialized",
      "RAG pipeline not initialized",
      transaction_id,
    ));
  };

  let region = match parse_region(request.region.as_deref()) {
    Ok(region) => region,
    Err(e) => {
      context.log_warn(&e.to_string(), "query-api").await;
      let allowed: Vec<&str> = Region::ALL.iter().map(|r| r.code()).collect();
      let error = ApiError::new("invalid_region", &e.to_string())
        .with_context(serde_json::json!({ "region": e.0, "allowed": allowed }));
      return Err((StatusCode::BAD_REQUEST, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id))));
    }
  };

  context
    .log_info(
      &format!("Query for {}: {}", region.map(|r| r.code()).unwrap_or("all regions"), request.query),
      "query-api",
    )
    .await;

  match pipeline.answer(&request.query, region).await {
    Ok(result) => {
      context.log_success(&format!("Answered with {} sources", result.sources.len()), "query-api").await;
      Ok(ResponseJson(BaseResponse::success(
        QueryResponse { answer: result.answer, sources: result.sources },
        transaction_id,
      )))
    }
    Err(e) => {
      context.log_error(&format!("Query failed: {:#}", e), "query-api").await;
      Err(error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "query_failed",
        &format!("Query failed: {}", e),
        transaction_id,
      ))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_region() {
    assert_eq!(parse_region(None), Ok(None));
    assert_eq!(parse_region(Some("")), Ok(None));
    assert_eq!(parse_region(Some("  ")), Ok(None));
    assert_eq!(parse_region(Some("nyc")), Ok(Some(Region::Nyc)));
    assert_eq!(parse_region(Some("JP")), Ok(Some(Region::Jp)));
    assert!(parse_region(Some("EU")).is_err());
  }
}
