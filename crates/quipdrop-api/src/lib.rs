//! JSON REST API for Quipdrop.
//!
//! Exposes an axum [`Router`] backed by a [`ReleaseEngine`] over any
//! [`ReleaseStore`] and [`ContentProvider`]. TLS and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", quipdrop_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod fallbacks;
pub mod release;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  http::StatusCode,
  response::IntoResponse,
  routing::{get, post},
};
use quipdrop_core::{provider::ContentProvider, store::ReleaseStore};
use quipdrop_engine::ReleaseEngine;
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `QUIPDROP_` environment prefix. Every field has a default, so the server
/// is usable with zero configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  /// Endpoint of the external content provider.
  #[serde(default = "default_provider_url")]
  pub provider_url:          String,
  /// Provider tries per acquisition before falling back.
  #[serde(default = "default_provider_max_attempts")]
  pub provider_max_attempts: u32,
  /// Per-attempt timeout, in seconds.
  #[serde(default = "default_provider_timeout_secs")]
  pub provider_timeout_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("quipdrop.db") }
fn default_provider_url() -> String {
  quipdrop_provider_http::DEFAULT_ENDPOINT.to_owned()
}
fn default_provider_max_attempts() -> u32 { 8 }
fn default_provider_timeout_secs() -> u64 { 7 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  default_host(),
      port:                  default_port(),
      store_path:            default_store_path(),
      provider_url:          default_provider_url(),
      provider_max_attempts: default_provider_max_attempts(),
      provider_timeout_secs: default_provider_timeout_secs(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type. Methods other than the ones routed here are
/// answered with 405 by axum's method routing.
pub fn api_router<S, P>(engine: Arc<ReleaseEngine<S, P>>) -> Router<()>
where
  S: ReleaseStore + 'static,
  P: ContentProvider + 'static,
{
  Router::new()
    // Releases
    .route(
      "/release",
      get(release::get_or_create::<S, P>).post(release::get_or_create::<S, P>),
    )
    .route("/release/current", get(release::current::<S, P>))
    .route("/release/{id}/punchline", get(release::punchline::<S, P>))
    .route("/release/{id}/response", post(release::record_response::<S, P>))
    // Curated fallback pool
    .route("/fallbacks", post(fallbacks::create::<S, P>))
    .route("/fallbacks/{id}/active", post(fallbacks::set_active::<S, P>))
    .method_not_allowed_fallback(method_not_allowed)
    .with_state(engine)
}

/// Answers routed paths hit with an unrouted method. Axum's default 405 has
/// an empty body; every failure here carries the error envelope.
async fn method_not_allowed() -> impl IntoResponse {
  (
    StatusCode::METHOD_NOT_ALLOWED,
    Json(serde_json::json!({ "error": "method not allowed" })),
  )
}

// ─── Integration tests ────────────────────────────────────────────────────────
