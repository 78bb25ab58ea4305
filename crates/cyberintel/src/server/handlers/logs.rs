//! Logs endpoint handler

use axum::{
  extract::{Extension, Query, State},
  http::StatusCode,
  response::Json,
};
use uuid::Uuid;

use crate::server::{
  middleware::RequestContext,
  state::AppState,
  types::{ApiError, BaseResponse, LogsQuery, LogsResponse},
};

const DEFAULT_LOG_LIMIT: usize = 100;

/// GET /logs - Tail of the server log
pub async fn get_logs(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Query(params): Query<LogsQuery>,
) -> Result<Json<BaseResponse<LogsResponse>>, (StatusCode, Json<BaseResponse<()>>)> {
  let transaction_id = Uuid::new_v4();
  let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);

  match state.logger.get_logs(Some(limit), params.level.as_deref()).await {
    Ok(logs) => {
      context.log_info(&format!("Retrieved {} log entries", logs.len()), "logs-api").await;
      Ok(Json(BaseResponse::success(LogsResponse { logs }, transaction_id)))
    }
    Err(e) => {
      context.log_error(&format!("Failed to read logs: {}", e), "logs-api").await;
      let error = ApiError::new("logs_read_failed", &format!("Failed to read logs: {}", e));
      Err((StatusCode::INTERNAL_SERVER_ERROR, Json(BaseResponse::<()>::error(vec![error], transaction_id))))
    }
  }
}
