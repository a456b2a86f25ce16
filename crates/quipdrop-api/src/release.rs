//! Handlers for `/release` endpoints.
//!
//! | Method     | Path                       | Notes |
//! |------------|----------------------------|-------|
//! | `GET/POST` | `/release`                 | Optional `date`, `period`, `force`; defaults to the current UTC slot |
//! | `GET`      | `/release/current`         | Lookback selection; optional `user_id` |
//! | `GET`      | `/release/{id}/punchline`  | Reveal the withheld punchline |
//! | `POST`     | `/release/{id}/response`   | Body: `{"user_id": "..."}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use quipdrop_core::{provider::ContentProvider, slot::SlotId, store::ReleaseStore};
use quipdrop_engine::ReleaseEngine;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Get or create ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReleaseParams {
  /// ISO calendar day; defaults to the current UTC day.
  pub date:   Option<String>,
  /// `EARLY` or `LATE`; defaults to the current UTC period.
  pub period: Option<String>,
  /// `1` or `true` forces re-acquisition over an existing release.
  pub force:  Option<String>,
}

/// `GET|POST /release[?date=...][&period=...][&force=true]`
pub async fn get_or_create<S, P>(
  State(engine): State<Arc<ReleaseEngine<S, P>>>,
  Query(params): Query<ReleaseParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  let slot =
    SlotId::from_params(params.date.as_deref(), params.period.as_deref(), Utc::now())
      .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let force = matches!(params.force.as_deref(), Some("1" | "true"));

  let (release, origin) = engine.get_or_create_release(slot, force).await?;
  Ok(Json(json!({ "data": release.summary(), "source": origin.as_str() })))
}

// ─── Current (lookback selection) ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CurrentParams {
  /// Requester identity; parsed here rather than by the extractor so a
  /// malformed value gets the JSON error envelope, not a plain-text 400.
  pub user_id: Option<String>,
}

/// `GET /release/current[?user_id=<uuid>]`
pub async fn current<S, P>(
  State(engine): State<Arc<ReleaseEngine<S, P>>>,
  Query(params): Query<CurrentParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  let user = params
    .user_id
    .as_deref()
    .map(|raw| {
      Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("invalid user_id {raw:?}: use a UUID")))
    })
    .transpose()?;

  let selected = engine.current_release_for_user(user, Utc::now()).await?;
  Ok(Json(json!({
    "data": selected.summary,
    "placeholder": selected.placeholder,
  })))
}

// ─── Punchline reveal ────────────────────────────────────────────────────────

/// `GET /release/{id}/punchline`
pub async fn punchline<S, P>(
  State(engine): State<Arc<ReleaseEngine<S, P>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  let release = engine
    .store()
    .get_release_by_id(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("release {id} not found")))?;

  Ok(Json(json!({
    "data": { "release_id": release.release_id, "punchline": release.punchline },
  })))
}

// ─── Response recording ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResponseBody {
  pub user_id: Uuid,
}

/// `POST /release/{id}/response` — body: `{"user_id":"..."}`. Idempotent.
pub async fn record_response<S, P>(
  State(engine): State<Arc<ReleaseEngine<S, P>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ResponseBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  let exists = engine
    .store()
    .get_release_by_id(id)
    .await
    .map_err(ApiError::store)?
    .is_some();
  if !exists {
    return Err(ApiError::NotFound(format!("release {id} not found")));
  }

  engine
    .store()
    .record_response(body.user_id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
