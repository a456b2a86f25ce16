//! The `ReleaseStore` trait and supporting row types.
//!
//! The trait is implemented by storage backends (e.g.
//! `quipdrop-store-sqlite`). The engine and API depend on this abstraction,
//! not on any concrete backend.

use std::{collections::HashSet, future::Future};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  release::{Candidate, Release},
  slot::SlotId,
};

// ─── Row types ───────────────────────────────────────────────────────────────

/// One row of the history scan: just the fields the dedup index needs.
#[derive(Debug, Clone)]
pub struct HistoryRow {
  pub source_api_id: String,
  pub setup:         String,
  pub punchline:     String,
}

/// One entry of the curated fallback pool.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FallbackRow {
  pub fallback_id: Uuid,
  pub setup:       String,
  pub punchline:   String,
  pub is_active:   bool,
  pub created_at:  DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Quipdrop storage backend.
///
/// The single write that matters for correctness is [`upsert_release`]: an
/// atomic insert-or-replace keyed by `(date, period)`. The unique key is the
/// serialization point for concurrent acquisitions of the same slot — no
/// external lock exists or is needed.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
///
/// [`upsert_release`]: ReleaseStore::upsert_release
pub trait ReleaseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Releases ──────────────────────────────────────────────────────────

  /// The committed release for `slot`, or `None` if the slot has never been
  /// committed.
  fn get_release(
    &self,
    slot: SlotId,
  ) -> impl Future<Output = Result<Option<Release>, Self::Error>> + Send + '_;

  /// Look a release up by its id. Used by the punchline reveal.
  fn get_release_by_id(
    &self,
    release_id: Uuid,
  ) -> impl Future<Output = Result<Option<Release>, Self::Error>> + Send + '_;

  /// All committed releases for the given slots, in one batch query. Order
  /// is unspecified; callers re-order against their slot sequence.
  fn releases_for_slots<'a>(
    &'a self,
    slots: &'a [SlotId],
  ) -> impl Future<Output = Result<Vec<Release>, Self::Error>> + Send + 'a;

  /// Atomically commit `candidate` under `slot`, replacing any existing row
  /// for that key, and return the row that won. Concurrent callers for the
  /// same slot converge on one final row.
  fn upsert_release<'a>(
    &'a self,
    slot:      SlotId,
    candidate: &'a Candidate,
  ) -> impl Future<Output = Result<Release, Self::Error>> + Send + 'a;

  // ── History ───────────────────────────────────────────────────────────

  /// The most recent `limit` committed rows, newest first. Feeds the
  /// used-content index; the cap keeps index construction bounded.
  fn load_history(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<HistoryRow>, Self::Error>> + Send + '_;

  // ── Curated fallback pool ─────────────────────────────────────────────

  /// All fallback entries currently flagged active.
  fn active_fallbacks(
    &self,
  ) -> impl Future<Output = Result<Vec<FallbackRow>, Self::Error>> + Send + '_;

  /// Add an entry to the curated fallback pool (active by default).
  fn add_fallback(
    &self,
    setup:     String,
    punchline: String,
  ) -> impl Future<Output = Result<FallbackRow, Self::Error>> + Send + '_;

  /// Flip an entry's active flag. Returns `false` if the entry is unknown.
  fn set_fallback_active(
    &self,
    fallback_id: Uuid,
    is_active:   bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── User responses ────────────────────────────────────────────────────

  /// Record that `user_id` has responded to `release_id`. Idempotent —
  /// repeat submissions are ignored.
  fn record_response(
    &self,
    user_id:    Uuid,
    release_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Of `release_ids`, the subset the user has already responded to.
  fn responded_release_ids<'a>(
    &'a self,
    user_id:     Uuid,
    release_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<HashSet<Uuid>, Self::Error>> + Send + 'a;
}
