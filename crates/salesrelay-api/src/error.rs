//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is translated to a structured `{"error": ...}` JSON body
//! at the request boundary; nothing is allowed to crash the handler task.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or invalid bearer credential.
  #[error("authentication required")]
  Unauthorized,

  /// Valid credential, but the identity lacks the superuser flag.
  #[error("superuser privileges required")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The upstream backend was unreachable or answered with something
  /// other than JSON. `preview` carries the first bytes of a non-JSON
  /// body to aid debugging.
  #[error("upstream error: {details}")]
  Upstream {
    details: String,
    preview: Option<String>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "authentication required" })),
      )
        .into_response(),
      ApiError::Forbidden => (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "superuser privileges required" })),
      )
        .into_response(),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Upstream { details, preview } => {
        tracing::warn!(%details, "upstream request failed");
        let mut body = json!({
          "error":   "invalid upstream response",
          "details": details,
        });
        if let Some(preview) = preview {
          body["response_preview"] = json!(preview);
        }
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": e.to_string() })),
        )
          .into_response()
      }
    }
  }
}
