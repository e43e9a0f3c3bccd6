//! HTTP-facing error type for the webhook endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use status_engine::NormalizeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("No payload")]
  NoPayload,

  #[error("invalid JSON: {0}")]
  InvalidJson(#[from] serde_json::Error),

  #[error(transparent)]
  Normalize(#[from] NormalizeError),
}

/// Error body: `{"error": "...", "field": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    tracing::warn!(error = %self, "rejected webhook payload");
    let body = ErrorBody {
      error: self.to_string(),
      field: match &self {
        Self::Normalize(e) => Some(e.field().to_string()),
        _ => None,
      },
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
  }
}
