//! Release and candidate types — the content model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::SlotId;

// ─── Release ─────────────────────────────────────────────────────────────────

/// The committed content for one slot. At most one release exists per
/// [`SlotId`], enforced by the store's unique key. A release is created once
/// by the engine's commit step and never updated, except by a forced refresh
/// which overwrites the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
  pub release_id:    Uuid,
  #[serde(flatten)]
  pub slot:          SlotId,
  /// The primary body, delivered immediately.
  pub setup:         String,
  /// The secondary body, withheld from initial delivery and revealed on
  /// explicit request.
  pub punchline:     String,
  /// Provenance tag tracing the content to its origin; used only for
  /// deduplication, never shown to end users.
  pub source_api_id: String,
  pub created_at:    DateTime<Utc>,
}

impl Release {
  pub fn summary(&self) -> ReleaseSummary {
    ReleaseSummary {
      release_id:    self.release_id,
      slot:          self.slot,
      setup:         self.setup.clone(),
      source_api_id: self.source_api_id.clone(),
    }
  }
}

/// The outward-facing view of a release: everything except the punchline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSummary {
  pub release_id:    Uuid,
  #[serde(flatten)]
  pub slot:          SlotId,
  pub setup:         String,
  pub source_api_id: String,
}

// ─── Candidate ───────────────────────────────────────────────────────────────

/// Unvalidated content from the provider, the curated fallback pool, or the
/// static fallback list. Promoted to a [`Release`] only after passing the
/// not-yet-used check and the commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
  pub setup:         String,
  pub punchline:     String,
  pub source_api_id: String,
}

impl Candidate {
  /// The normalized dedup key for this candidate's text.
  pub fn fingerprint(&self) -> String {
    crate::dedup::fingerprint(&self.setup, &self.punchline)
  }
}
