//! The `ContentProvider` trait — the unreliable external content source.

use std::future::Future;

use crate::release::Candidate;

/// Abstraction over the upstream content provider.
///
/// A single fetch returns `Ok(Some(candidate))` for a payload that passed
/// validation, `Ok(None)` for a well-formed response that yielded nothing
/// usable, and `Err` for transport or status failures. The engine treats the
/// latter two identically — the attempt is discarded and the retry loop
/// continues. Implementations should not retry internally; the attempt
/// budget and the per-attempt timeout both belong to the engine.
pub trait ContentProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_candidate(
    &self,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;
}
