//! REST API types with schemars annotations for schema generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::SourceCitation;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API requested by the client
  pub requested: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: serde_json::Value,
}

// Status/Version Endpoints
// =======================

/// Response for / endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RootResponse {
  pub message: String,
}

/// Response for /status endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  /// `healthy` when queries can be answered, `degraded` otherwise
  pub status: String,

  /// Whether the query pipeline initialised
  pub pipeline_ready: bool,

  /// Rows in the vector index (absent when it cannot be read)
  pub indexed_documents: Option<usize>,

  /// Language model answering questions, if any
  pub generator: Option<String>,

  /// Server version
  pub version: String,
}

/// Response for /version endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  /// Current API version
  pub version: String,
}

/// Response for /api endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiInfoResponse {
  /// Latest API version
  pub latest: String,

  /// Version information
  pub versions: ApiVersions,
}

/// API version details
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiVersions {
  /// Latest version
  pub latest: String,

  /// Currently active versions
  pub active: Vec<String>,
}

/// Response for /api/schema endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SchemaResponse {
  /// JSON schema of the /query request body
  pub query_request: serde_json::Value,

  /// JSON schema of the /query response data
  pub query_response: serde_json::Value,
}

// Logs Endpoint
// =============

/// Response for /logs endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  /// JSON log entries
  pub logs: Vec<LogEntry>,
}

/// Query parameters for /logs
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Most recent entries to return (default 100)
  pub limit: Option<usize>,

  /// Only entries at this level (`all` for every level)
  pub level: Option<String>,
}

/// Individual log entry (re-exported from bentley)
pub type LogEntry = bentley::daemon_logs::LogEntry;

// Query Endpoint
// ==============

/// Request for /query endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryRequest {
  /// Free-text question
  pub query: String,

  /// HK, JP or NYC; omitted or empty searches every region
  #[serde(default)]
  pub region: Option<String>,
}

/// Response for /query endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryResponse {
  /// Generated answer, fallback context or refusal text
  pub answer: String,

  /// Sources in citation order; `[k]` in the answer refers to `sources[k-1]`
  pub sources: Vec<SourceCitation>,
}

// Helper Functions
// ================

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  /// Create a new API error
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }

  pub fn with_context(mut self, context: serde_json::Value) -> Self {
    self.context = context;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Region;

  #[test]
  fn test_success_response_flattens_data() {
    let response = BaseResponse::success(
      QueryResponse {
        answer: "Patch promptly [1].".to_string(),
        sources: vec![SourceCitation {
          title: "Patching".to_string(),
          url: "https://www.cybersecurity.hk/en/expert-1.php".to_string(),
          region: Region::Hk,
        }],
      },
      Uuid::nil(),
    );

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["answer"], "Patch promptly [1].");
    assert_eq!(json["sources"][0]["region"], "HK");
    assert_eq!(json["versioning"]["latest"], env!("CARGO_PKG_VERSION"));
    assert!(json.get("errors").is_none());
  }

  #[test]
  fn test_error_response_carries_errors() {
    let response = BaseResponse::<()>::error(
      vec![ApiError::new("invalid_region", "unknown region 'EU'")],
      Uuid::nil(),
    );

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["errors"][0]["key"], "invalid_region");
    assert_eq!(json["errors"][0]["message"], "unknown region 'EU'");
  }

  #[test]
  fn test_query_request_region_is_optional() {
    let request: QueryRequest = serde_json::from_str(r#"{"query": "What is phishing?"}"#).unwrap();
    assert_eq!(request.query, "What is phishing?");
    assert!(request.region.is_none());
  }
}
