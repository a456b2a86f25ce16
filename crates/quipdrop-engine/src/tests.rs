//! Engine tests against an in-memory SQLite store and a scripted provider.

use std::{
  collections::VecDeque,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, NaiveDate, TimeZone as _, Utc};
use quipdrop_core::{
  provider::ContentProvider,
  release::Candidate,
  slot::{Period, SlotId},
  store::ReleaseStore,
};
use quipdrop_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  EngineConfig, EngineError, ReleaseEngine, ReleaseOrigin, select::LOOKBACK_SLOTS,
};

// ─── Scripted provider ───────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("scripted provider failure")]
struct ScriptedFailure;

#[derive(Clone)]
enum Step {
  Candidate(Candidate),
  Empty,
  Fail,
  /// Sleeps far beyond any per-attempt timeout used in tests.
  Hang,
}

/// A provider that replays a fixed script and counts calls. Once the script
/// is exhausted, every further call fails.
#[derive(Clone)]
struct ScriptedProvider {
  steps: Arc<Mutex<VecDeque<Step>>>,
  calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
  fn new(steps: Vec<Step>) -> Self {
    Self {
      steps: Arc::new(Mutex::new(steps.into())),
      calls: Arc::new(AtomicUsize::new(0)),
    }
  }

  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl ContentProvider for ScriptedProvider {
  type Error = ScriptedFailure;

  async fn fetch_candidate(&self) -> Result<Option<Candidate>, ScriptedFailure> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let step = self.steps.lock().unwrap().pop_front();
    match step {
      Some(Step::Candidate(candidate)) => Ok(Some(candidate)),
      Some(Step::Empty) => Ok(None),
      Some(Step::Fail) | None => Err(ScriptedFailure),
      Some(Step::Hang) => {
        tokio::time::sleep(Duration::from_secs(120)).await;
        Ok(None)
      }
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn candidate(setup: &str, punchline: &str, id: &str) -> Candidate {
  Candidate {
    setup:         setup.to_owned(),
    punchline:     punchline.to_owned(),
    source_api_id: id.to_owned(),
  }
}

fn slot(day: u32, period: Period) -> SlotId {
  SlotId::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), period)
}

fn config() -> EngineConfig {
  EngineConfig {
    max_attempts:    3,
    attempt_timeout: Duration::from_millis(50),
  }
}

async fn engine(
  steps: Vec<Step>,
) -> (ReleaseEngine<SqliteStore, ScriptedProvider>, Arc<SqliteStore>, ScriptedProvider) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let provider = ScriptedProvider::new(steps);
  let engine = ReleaseEngine::new(store.clone(), provider.clone(), config());
  (engine, store, provider)
}

// ─── Cache-hit path ──────────────────────────────────────────────────────────

#[tokio::test]
async fn second_request_returns_identical_release_without_provider_calls() {
  let (engine, _store, provider) =
    engine(vec![Step::Candidate(candidate("Why once?", "Once only.", "a1"))]).await;
  let target = slot(1, Period::Early);

  let (first, origin) = engine.get_or_create_release(target, false).await.unwrap();
  assert_eq!(origin, ReleaseOrigin::Api);
  assert_eq!(provider.calls(), 1);

  let (second, origin) = engine.get_or_create_release(target, false).await.unwrap();
  assert_eq!(origin, ReleaseOrigin::Existing);
  assert_eq!(second, first);
  assert_eq!(provider.calls(), 1, "cache hit must perform zero provider calls");
}

#[tokio::test]
async fn concurrent_acquisitions_converge_on_one_release() {
  // Enough distinct candidates that every racer missing the cache can win an
  // attempt on its own.
  let steps: Vec<Step> = (0..8)
    .map(|i| {
      Step::Candidate(candidate(&format!("Why number {i}?"), "Because.", &format!("c{i}")))
    })
    .collect();
  let (engine, store, _provider) = engine(steps).await;
  let engine = Arc::new(engine);
  let target = slot(5, Period::Early);

  let mut handles = Vec::new();
  for _ in 0..8 {
    let engine = engine.clone();
    handles.push(tokio::spawn(async move {
      engine.get_or_create_release(target, false).await.unwrap().0
    }));
  }
  let mut returned = Vec::new();
  for handle in handles {
    returned.push(handle.await.unwrap());
  }

  assert_eq!(store.release_count().await.unwrap(), 1);
  let committed = store.get_release(target).await.unwrap().unwrap();
  for release in &returned {
    assert_eq!(release.slot, target);
    assert_eq!(
      release.release_id, committed.release_id,
      "every caller must observe the single committed row"
    );
  }
}

// ─── Dedup against history ───────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_fingerprint_is_retried_until_novel() {
  let (engine, store, provider) = engine(vec![
    // Same text as history under a fresh provenance tag: fingerprint match.
    Step::Candidate(candidate("Why did it rain?", "Because clouds.", "fresh-id")),
    Step::Candidate(candidate("Why is it dry?", "No clouds.", "f2")),
  ])
  .await;

  store
    .upsert_release(
      slot(1, Period::Early),
      &candidate("Why did it rain?", "Because clouds.", "f1"),
    )
    .await
    .unwrap();

  let (release, origin) = engine
    .get_or_create_release(slot(1, Period::Late), false)
    .await
    .unwrap();

  assert_eq!(origin, ReleaseOrigin::Api);
  assert_eq!(release.setup, "Why is it dry?");
  assert_eq!(provider.calls(), 2, "one discarded duplicate, one novel");
}

#[tokio::test]
async fn used_provenance_tag_is_rejected_even_with_new_text() {
  let (engine, store, _provider) = engine(vec![
    Step::Candidate(candidate("Why brand new text?", "Still tagged.", "seen-tag")),
    Step::Candidate(candidate("Why fresh?", "Fresh tag too.", "new-tag")),
  ])
  .await;

  store
    .upsert_release(
      slot(1, Period::Early),
      &candidate("Why old?", "Old.", "seen-tag"),
    )
    .await
    .unwrap();

  let (release, _) = engine
    .get_or_create_release(slot(1, Period::Late), false)
    .await
    .unwrap();
  assert_eq!(release.source_api_id, "new-tag");
}

// ─── Fallback chain ──────────────────────────────────────────────────────────

#[tokio::test]
async fn dead_provider_and_empty_pool_still_succeed_via_statics() {
  let (engine, _store, provider) = engine(vec![Step::Hang, Step::Hang, Step::Hang]).await;

  let (release, origin) = engine
    .get_or_create_release(slot(1, Period::Early), false)
    .await
    .unwrap();

  assert_eq!(origin, ReleaseOrigin::Fallback);
  assert!(release.source_api_id.starts_with("fallback:static:"));
  assert_eq!(provider.calls(), 3, "every attempt must be consumed first");
}

#[tokio::test]
async fn curated_pool_is_preferred_over_statics() {
  let (engine, store, _provider) = engine(vec![Step::Fail, Step::Empty, Step::Fail]).await;

  let row = store
    .add_fallback("Why curated?".into(), "Operators added me.".into())
    .await
    .unwrap();

  let (release, origin) = engine
    .get_or_create_release(slot(1, Period::Early), false)
    .await
    .unwrap();

  assert_eq!(origin, ReleaseOrigin::Fallback);
  assert_eq!(release.source_api_id, format!("fallback:{}", row.fallback_id));
}

#[tokio::test]
async fn already_used_curated_entries_are_skipped() {
  let (engine, store, _provider) = engine(vec![Step::Fail]).await;

  store
    .add_fallback("Why repeat?".into(), "Never.".into())
    .await
    .unwrap();
  // The curated entry's text is already committed under another slot.
  store
    .upsert_release(slot(1, Period::Early), &candidate("Why repeat?", "Never.", "x"))
    .await
    .unwrap();

  let (release, _) = engine
    .get_or_create_release(slot(1, Period::Late), false)
    .await
    .unwrap();
  assert!(release.source_api_id.starts_with("fallback:static:"));
}

#[tokio::test]
async fn exhausting_every_source_reports_no_unused_candidate() {
  let (engine, store, _provider) = engine(vec![Step::Fail, Step::Fail, Step::Fail]).await;

  // Burn all four static entries into history under other slots.
  let statics = [
    ("Why did the scarecrow win an award?", "Because he was outstanding in his field."),
    ("What do you call fake spaghetti?", "An impasta."),
    ("Why do cows wear bells?", "Because their horns do not work."),
    ("Why could the bicycle not stand up by itself?", "It was two-tired."),
  ];
  for (day, (setup, punchline)) in statics.iter().enumerate() {
    store
      .upsert_release(
        slot(day as u32 + 1, Period::Early),
        &candidate(setup, punchline, &format!("burned-{day}")),
      )
      .await
      .unwrap();
  }

  let result = engine.get_or_create_release(slot(9, Period::Late), false).await;
  assert!(matches!(result, Err(EngineError::NoUnusedCandidate)));
}

// ─── Forced refresh ──────────────────────────────────────────────────────────

#[tokio::test]
async fn force_refresh_reacquires_over_the_same_key() {
  let (engine, store, _provider) = engine(vec![
    Step::Candidate(candidate("Why first?", "First.", "a1")),
    Step::Candidate(candidate("Why second?", "Second.", "a2")),
  ])
  .await;
  let target = slot(1, Period::Early);

  engine.get_or_create_release(target, false).await.unwrap();
  let (refreshed, origin) = engine.get_or_create_release(target, true).await.unwrap();

  assert_eq!(origin, ReleaseOrigin::Api);
  assert_eq!(refreshed.setup, "Why second?");
  assert_eq!(store.release_count().await.unwrap(), 1, "overwrite, not a second row");
}

// ─── Store failures and deadlines ────────────────────────────────────────────

#[test]
fn store_error_stages_are_reported() {
  // A store failure mid-acquisition must carry the stage tag. Closing the
  // connection under the engine is awkward with tokio-rusqlite, so assert
  // the stage surface on a constructed error instead.
  let err = EngineError::store("load-history", ScriptedFailure);
  assert_eq!(err.stage(), Some("load-history"));
  assert!(err.to_string().contains("load-history"));
  assert!(EngineError::NoUnusedCandidate.stage().is_none());
}

#[tokio::test]
async fn exceeded_deadline_aborts_without_committing() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let provider = ScriptedProvider::new(vec![Step::Hang]);
  // Generous per-attempt timeout so only the overall deadline can fire.
  let engine = ReleaseEngine::new(
    store.clone(),
    provider,
    EngineConfig { max_attempts: 1, attempt_timeout: Duration::from_secs(30) },
  );
  let target = slot(1, Period::Early);

  let deadline = tokio::time::Instant::now() + Duration::from_millis(50);
  let result = engine.get_or_create_release_before(target, false, deadline).await;

  assert!(matches!(result, Err(EngineError::DeadlineExceeded)));
  assert!(
    store.get_release(target).await.unwrap().is_none(),
    "a cancelled acquisition must never commit"
  );
}

// ─── Lookback selection ──────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
  // 15:00 UTC — the current slot is (2024-06-01, LATE).
  Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap()
}

fn current_slot() -> SlotId {
  SlotId::at(now())
}

#[tokio::test]
async fn empty_window_yields_a_placeholder() {
  let (engine, _store, _provider) = engine(vec![]).await;

  let selected = engine.current_release_for_user(None, now()).await.unwrap();
  assert!(selected.placeholder);
  assert_eq!(selected.summary.release_id, Uuid::nil());
  assert_eq!(selected.summary.slot, current_slot());
}

#[tokio::test]
async fn anonymous_caller_gets_the_newest_release() {
  let (engine, store, _provider) = engine(vec![]).await;

  let older = current_slot().predecessor();
  store
    .upsert_release(older, &candidate("Why older?", "Older.", "a"))
    .await
    .unwrap();
  store
    .upsert_release(current_slot(), &candidate("Why newest?", "Newest.", "b"))
    .await
    .unwrap();

  let selected = engine.current_release_for_user(None, now()).await.unwrap();
  assert!(!selected.placeholder);
  assert_eq!(selected.summary.setup, "Why newest?");
}

#[tokio::test]
async fn answered_releases_are_skipped_for_the_user() {
  let (engine, store, _provider) = engine(vec![]).await;
  let user = Uuid::new_v4();

  let older = current_slot().predecessor();
  let older_release = store
    .upsert_release(older, &candidate("Why older?", "Older.", "a"))
    .await
    .unwrap();
  let newest_release = store
    .upsert_release(current_slot(), &candidate("Why newest?", "Newest.", "b"))
    .await
    .unwrap();

  store.record_response(user, newest_release.release_id).await.unwrap();

  let selected = engine.current_release_for_user(Some(user), now()).await.unwrap();
  assert_eq!(selected.summary.release_id, older_release.release_id);
}

#[tokio::test]
async fn fully_answered_window_falls_back_to_the_newest() {
  let (engine, store, _provider) = engine(vec![]).await;
  let user = Uuid::new_v4();

  let a = store
    .upsert_release(current_slot().predecessor(), &candidate("Why a?", "A.", "a"))
    .await
    .unwrap();
  let b = store
    .upsert_release(current_slot(), &candidate("Why b?", "B.", "b"))
    .await
    .unwrap();
  store.record_response(user, a.release_id).await.unwrap();
  store.record_response(user, b.release_id).await.unwrap();

  let selected = engine.current_release_for_user(Some(user), now()).await.unwrap();
  assert!(!selected.placeholder);
  assert_eq!(selected.summary.release_id, b.release_id);
}

#[tokio::test]
async fn non_question_releases_are_filtered_and_setups_trimmed() {
  let (engine, store, _provider) = engine(vec![]).await;

  store
    .upsert_release(
      current_slot(),
      &candidate("Not a question at all.", "Still stored.", "a"),
    )
    .await
    .unwrap();
  store
    .upsert_release(
      current_slot().predecessor(),
      &candidate("Why trim? Trailing text here.", "Kept.", "b"),
    )
    .await
    .unwrap();

  let selected = engine.current_release_for_user(None, now()).await.unwrap();
  assert!(!selected.placeholder);
  assert_eq!(selected.summary.setup, "Why trim?");
}

#[tokio::test]
async fn lookback_window_is_bounded() {
  let (engine, store, _provider) = engine(vec![]).await;

  // A release just outside the window must never be selected.
  let mut outside = current_slot();
  for _ in 0..=LOOKBACK_SLOTS {
    outside = outside.predecessor();
  }
  store
    .upsert_release(outside, &candidate("Why outside?", "Too old.", "a"))
    .await
    .unwrap();

  let selected = engine.current_release_for_user(None, now()).await.unwrap();
  assert!(selected.placeholder);
}
