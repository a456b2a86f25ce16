//! Error type for `quipdrop-engine`.

use thiserror::Error;

/// An acquisition failure.
///
/// Provider-level trouble never appears here — it is absorbed by the retry
/// loop and only matters through its exhaustion. What does surface:
///
/// - [`Store`](EngineError::Store): a store round-trip failed. Fatal — the
///   engine cannot safely proceed without knowing current state. The `stage`
///   tag identifies which step failed.
/// - [`NoUnusedCandidate`](EngineError::NoUnusedCandidate): provider, curated
///   pool, and static list are all exhausted. Expected but rare; operators
///   should add fallback content rather than treat it as an infrastructure
///   bug.
/// - [`DeadlineExceeded`](EngineError::DeadlineExceeded): the caller-supplied
///   overall deadline ran out mid-acquisition.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("store error at {stage}: {source}")]
  Store {
    stage:  &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("no unused candidate available from any source; add fallback content or raise the attempt budget")]
  NoUnusedCandidate,

  #[error("acquisition deadline exceeded")]
  DeadlineExceeded,
}

impl EngineError {
  pub(crate) fn store(
    stage:  &'static str,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Store { stage, source: Box::new(source) }
  }

  /// The stage tag for store failures; `None` for the other variants.
  pub fn stage(&self) -> Option<&'static str> {
    match self {
      Self::Store { stage, .. } => Some(stage),
      _ => None,
    }
  }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
