//! The release engine — produces the unique release for a requested slot.
//!
//! Guarantees: concurrent requests for the same never-yet-committed slot
//! converge on one committed release, and content is never knowingly
//! repeated. The engine owns the acquisition-with-retry loop against the
//! external provider, the layered fallback chain (curated pool, then static
//! list), and the idempotent commit.
//!
//! Configuration is captured once at construction in [`EngineConfig`]; the
//! engine reads nothing ambient at call time, so behaviour is fully
//! deterministic under injected configuration.

mod statics;

pub mod error;
pub mod select;

pub use error::{EngineError, Result};
pub use select::SelectedRelease;

use std::{sync::Arc, time::Duration};

use rand::seq::SliceRandom as _;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use quipdrop_core::{
  dedup::UsedContentIndex,
  parse::candidate_from_parts,
  provider::ContentProvider,
  release::{Candidate, Release},
  slot::SlotId,
  store::ReleaseStore,
};

/// Hard cap on the history scan feeding the used-content index. Correctness
/// (never repeat) wins over scan cost; installations beyond this scale should
/// age out history.
pub const HISTORY_SCAN_CAP: u32 = 5000;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Acquisition behaviour, fixed at engine construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Sequential tries against the external provider before falling back.
  pub max_attempts:    u32,
  /// Per-attempt bound on one provider call.
  pub attempt_timeout: Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_attempts:    8,
      attempt_timeout: Duration::from_secs(7),
    }
  }
}

// ─── Origin ──────────────────────────────────────────────────────────────────

/// Where a returned release came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOrigin {
  /// Already committed; no acquisition performed.
  Existing,
  /// Freshly acquired from the external provider.
  Api,
  /// Curated pool or static list.
  Fallback,
}

impl ReleaseOrigin {
  /// The wire token used in the response envelope's `source` field.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Existing => "existing",
      Self::Api => "api",
      Self::Fallback => "fallback",
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The release engine. Cheap to share behind an `Arc`; holds no mutable
/// state of its own — the store is the only shared mutable resource.
pub struct ReleaseEngine<S, P> {
  store:    Arc<S>,
  provider: P,
  config:   EngineConfig,
}

impl<S, P> ReleaseEngine<S, P>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  pub fn new(store: Arc<S>, provider: P, config: EngineConfig) -> Self {
    Self { store, provider, config }
  }

  /// The underlying store. Handlers outside the acquisition path (punchline
  /// reveal, fallback administration, response recording) go through here.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Produce the release for `slot`, creating it exactly once if absent.
  ///
  /// Unless `force_refresh`, an already-committed release is returned
  /// unchanged with zero provider calls. On a miss the engine builds the
  /// used-content index from history, runs the provider retry loop, then the
  /// fallback chain, and commits the winner via an atomic upsert keyed on
  /// the slot — the store's conflict resolution is what makes concurrent
  /// invocation safe.
  ///
  /// The returned future is cancel-safe: dropping it at any suspension point
  /// before the commit round-trip leaves the store untouched.
  pub async fn get_or_create_release(
    &self,
    slot:          SlotId,
    force_refresh: bool,
  ) -> Result<(Release, ReleaseOrigin)> {
    if !force_refresh {
      let existing = self
        .store
        .get_release(slot)
        .await
        .map_err(|e| EngineError::store("read-existing-release", e))?;
      if let Some(release) = existing {
        return Ok((release, ReleaseOrigin::Existing));
      }
    }

    // History must be loaded before any novelty check. The index lives only
    // for this acquisition.
    let history = self
      .store
      .load_history(HISTORY_SCAN_CAP)
      .await
      .map_err(|e| EngineError::store("load-history", e))?;
    let used = UsedContentIndex::from_history(&history);

    let (candidate, origin) = match self.acquire_from_provider(&used).await {
      Some(candidate) => (candidate, ReleaseOrigin::Api),
      None => (self.fallback_candidate(&used).await?, ReleaseOrigin::Fallback),
    };

    let release = self
      .store
      .upsert_release(slot, &candidate)
      .await
      .map_err(|e| EngineError::store("commit-release", e))?;

    info!(
      slot = %slot,
      origin = origin.as_str(),
      source_api_id = %release.source_api_id,
      "committed release"
    );
    Ok((release, origin))
  }

  /// [`get_or_create_release`] bounded by an overall deadline. Exceeding it
  /// aborts the acquisition at the next suspension point and surfaces
  /// [`EngineError::DeadlineExceeded`]; nothing half-validated is committed.
  ///
  /// [`get_or_create_release`]: ReleaseEngine::get_or_create_release
  pub async fn get_or_create_release_before(
    &self,
    slot:          SlotId,
    force_refresh: bool,
    deadline:      tokio::time::Instant,
  ) -> Result<(Release, ReleaseOrigin)> {
    tokio::time::timeout_at(deadline, self.get_or_create_release(slot, force_refresh))
      .await
      .map_err(|_| EngineError::DeadlineExceeded)?
  }

  // ── Acquisition sources ───────────────────────────────────────────────────

  /// Up to `max_attempts` sequential provider tries, each bounded by the
  /// per-attempt timeout. A try that errors, times out, parses to nothing,
  /// or yields an already-used candidate is discarded and the loop
  /// continues. Exhaustion is not an error — it falls through to fallback.
  async fn acquire_from_provider(&self, used: &UsedContentIndex) -> Option<Candidate> {
    for attempt in 1..=self.config.max_attempts {
      match timeout(self.config.attempt_timeout, self.provider.fetch_candidate()).await {
        Err(_) => debug!(attempt, "provider attempt timed out"),
        Ok(Err(e)) => debug!(attempt, error = %e, "provider attempt failed"),
        Ok(Ok(None)) => debug!(attempt, "provider payload yielded no candidate"),
        Ok(Ok(Some(candidate))) if used.contains(&candidate) => {
          debug!(attempt, source_api_id = %candidate.source_api_id, "candidate already used");
        }
        Ok(Ok(Some(candidate))) => return Some(candidate),
      }
    }
    None
  }

  /// The layered fallback chain: curated pool first, static list last.
  /// A store failure while reading the pool is tolerated — the static list
  /// still guarantees a result while any entry remains unused.
  async fn fallback_candidate(&self, used: &UsedContentIndex) -> Result<Candidate> {
    let pool = match self.store.active_fallbacks().await {
      Ok(rows) => rows,
      Err(e) => {
        warn!(error = %e, "curated fallback pool unavailable, using static list");
        Vec::new()
      }
    };

    let curated: Vec<Candidate> = pool
      .iter()
      .filter_map(|row| {
        candidate_from_parts(
          &row.setup,
          &row.punchline,
          format!("fallback:{}", row.fallback_id),
        )
      })
      .filter(|candidate| !used.contains(candidate))
      .collect();

    if let Some(candidate) = curated.choose(&mut rand::thread_rng()) {
      return Ok(candidate.clone());
    }

    let statics: Vec<Candidate> = statics::static_candidates()
      .into_iter()
      .filter(|candidate| !used.contains(candidate))
      .collect();

    statics
      .choose(&mut rand::thread_rng())
      .cloned()
      .ok_or(EngineError::NoUnusedCandidate)
  }
}

#[cfg(test)]
mod tests;
