//! Handlers for `/fallbacks` — operator maintenance of the curated pool.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use quipdrop_core::{
  parse::candidate_from_parts, provider::ContentProvider, store::ReleaseStore,
};
use quipdrop_engine::ReleaseEngine;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub setup:     String,
  pub punchline: String,
}

/// `POST /fallbacks` — body: `{"setup":"...?","punchline":"..."}`.
///
/// Content goes through the same question-shape validation as every other
/// source; the stored text is the normalized form.
pub async fn create<S, P>(
  State(engine): State<Arc<ReleaseEngine<S, P>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  let validated = candidate_from_parts(&body.setup, &body.punchline, "pending")
    .ok_or_else(|| {
      ApiError::BadRequest(
        "fallback content must be a question setup ending in '?' with a non-empty punchline"
          .to_owned(),
      )
    })?;

  let row = engine
    .store()
    .add_fallback(validated.setup, validated.punchline)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(row)))
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub is_active: bool,
}

/// `POST /fallbacks/{id}/active` — body: `{"is_active":false}`.
pub async fn set_active<S, P>(
  State(engine): State<Arc<ReleaseEngine<S, P>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  let known = engine
    .store()
    .set_fallback_active(id, body.is_active)
    .await
    .map_err(ApiError::store)?;
  if !known {
    return Err(ApiError::NotFound(format!("fallback {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
