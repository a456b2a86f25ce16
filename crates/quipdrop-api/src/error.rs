//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! The failure envelope is `{"error": <message>, "stage"?: <tag>}`. Status
//! mapping: 400 for malformed slot parameters, 404 for missing resources,
//! 409 for the exhausted-non-repeating-candidate condition, 500 for store or
//! infrastructure failure.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use quipdrop_engine::EngineError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Engine(#[from] EngineError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a raw store error from a handler outside the acquisition path.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, stage, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, None, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, None, m.clone()),
      ApiError::Engine(EngineError::NoUnusedCandidate) => (
        StatusCode::CONFLICT,
        Some("select-unused-candidate"),
        self.to_string(),
      ),
      ApiError::Engine(e @ EngineError::Store { .. }) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.stage(), e.to_string())
      }
      ApiError::Engine(EngineError::DeadlineExceeded) => {
        (StatusCode::INTERNAL_SERVER_ERROR, None, self.to_string())
      }
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, None, e.to_string()),
    };

    let mut body = json!({ "error": message });
    if let Some(stage) = stage {
      body["stage"] = json!(stage);
    }
    (status, Json(body)).into_response()
  }
}
