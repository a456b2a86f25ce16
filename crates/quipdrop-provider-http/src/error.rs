//! Error type for `quipdrop-provider-http`.

use thiserror::Error;

/// A transport, status, or decode failure on one provider fetch. All of
/// these are transient from the engine's point of view — it discards the
/// attempt and retries within its budget.
#[derive(Debug, Error)]
pub enum Error {
  #[error("provider request failed: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
