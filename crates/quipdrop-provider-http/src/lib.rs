//! HTTP implementation of [`ContentProvider`] over a JSON endpoint.
//!
//! One fetch is one GET. No internal retries and no request timeout here —
//! the engine owns the attempt budget and bounds each call with its
//! per-attempt timeout, so a hung request is cancelled by dropping the
//! future.

pub mod error;

pub use error::{Error, Result};

use quipdrop_core::{
  parse::parse_provider_payload, provider::ContentProvider, release::Candidate,
};
use tracing::debug;

/// The default public endpoint; serves a random question/answer joke as JSON.
pub const DEFAULT_ENDPOINT: &str = "https://official-joke-api.appspot.com/jokes/random";

/// A content provider backed by a configured HTTP endpoint.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpProvider {
  client:   reqwest::Client,
  endpoint: String,
}

impl HttpProvider {
  pub fn new(endpoint: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder().build()?;
    Ok(Self { client, endpoint: endpoint.into() })
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }
}

impl ContentProvider for HttpProvider {
  type Error = Error;

  async fn fetch_candidate(&self) -> Result<Option<Candidate>> {
    let payload: serde_json::Value = self
      .client
      .get(&self.endpoint)
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let candidate = parse_provider_payload(&payload);
    if candidate.is_none() {
      debug!(endpoint = %self.endpoint, "payload did not parse to a candidate");
    }
    Ok(candidate)
  }
}
