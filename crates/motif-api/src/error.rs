//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// `NotFound` and `BadRequest` messages go to the client verbatim. Store
/// failures are logged with full detail and answered with an opaque body;
/// driver internals never cross the wire.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "internal storage error".to_owned(),
        )
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
