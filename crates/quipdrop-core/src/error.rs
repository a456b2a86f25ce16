//! Error types for `quipdrop-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date {0:?}: use YYYY-MM-DD")]
  InvalidDate(String),

  #[error("invalid period {0:?}: use EARLY or LATE")]
  InvalidPeriod(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
