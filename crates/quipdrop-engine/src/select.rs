//! Consumer-side lookback selection.
//!
//! The presentation layer does not want "the slot's release" — it wants "the
//! newest release this user has not interacted with yet". Selection walks a
//! bounded lookback window instead of scanning history: compute the current
//! slot plus a few predecessors, fetch their committed releases in one batch,
//! keep the question-shaped ones, cross-reference the user's responses, and
//! pick the most recent slot without one. An empty window yields a
//! synthesized placeholder so the consumer always has something to render.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use quipdrop_core::{
  parse::question_setup,
  provider::ContentProvider,
  release::{Release, ReleaseSummary},
  slot::SlotId,
  store::ReleaseStore,
};

use crate::{EngineError, ReleaseEngine, Result};

/// How many predecessor slots the consumer considers beyond the current one.
pub const LOOKBACK_SLOTS: usize = 3;

const PLACEHOLDER_SETUP: &str = "Why don't skeletons fight each other?";

/// The outcome of lookback selection. `placeholder` marks a locally
/// synthesized stand-in returned when the store held nothing at all for the
/// window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRelease {
  pub summary:     ReleaseSummary,
  pub placeholder: bool,
}

impl<S, P> ReleaseEngine<S, P>
where
  S: ReleaseStore,
  P: ContentProvider,
{
  /// The release the consumer should show `user` at `now`.
  ///
  /// Preference order: most recent lookback slot the user has not responded
  /// to, then the newest committed release in the window, then a
  /// placeholder. Anonymous callers (`user == None`) skip the response
  /// cross-reference and get the newest available release.
  pub async fn current_release_for_user(
    &self,
    user: Option<Uuid>,
    now:  DateTime<Utc>,
  ) -> Result<SelectedRelease> {
    let slots = SlotId::at(now).lookback(LOOKBACK_SLOTS);

    let committed = self
      .store()
      .releases_for_slots(&slots)
      .await
      .map_err(|e| EngineError::store("load-lookback-releases", e))?;

    // Re-order the batch to match the window (newest first), then keep only
    // question-shaped releases, trimming each setup to its question.
    let candidates: Vec<ReleaseSummary> = slots
      .iter()
      .filter_map(|slot| committed.iter().find(|release| release.slot == *slot))
      .filter_map(question_shaped_summary)
      .collect();

    if let Some(user) = user
      && !candidates.is_empty()
    {
      let ids: Vec<Uuid> = candidates.iter().map(|c| c.release_id).collect();
      let responded = self
        .store()
        .responded_release_ids(user, &ids)
        .await
        .map_err(|e| EngineError::store("load-user-responses", e))?;

      if let Some(unanswered) = candidates
        .iter()
        .find(|candidate| !responded.contains(&candidate.release_id))
      {
        return Ok(SelectedRelease { summary: unanswered.clone(), placeholder: false });
      }
    }

    match candidates.into_iter().next() {
      Some(summary) => Ok(SelectedRelease { summary, placeholder: false }),
      None => Ok(SelectedRelease {
        summary:     placeholder_summary(slots[0]),
        placeholder: true,
      }),
    }
  }
}

fn question_shaped_summary(release: &Release) -> Option<ReleaseSummary> {
  let setup = question_setup(&release.setup)?;
  Some(ReleaseSummary {
    release_id: release.release_id,
    slot: release.slot,
    setup,
    source_api_id: release.source_api_id.clone(),
  })
}

fn placeholder_summary(slot: SlotId) -> ReleaseSummary {
  ReleaseSummary {
    release_id:    Uuid::nil(),
    slot,
    setup:         PLACEHOLDER_SETUP.to_owned(),
    source_api_id: "placeholder".to_owned(),
  }
}
