//! Content deduplication — fingerprints and the used-content index.
//!
//! The index is rebuilt from history at the start of every acquisition and
//! discarded after the commit. It is never cached across acquisitions:
//! history may change between calls, and a stale index would permit a real
//! repeat.

use std::collections::HashSet;

use crate::{parse::normalize_whitespace, release::Candidate, store::HistoryRow};

/// The normalized dedup key for a setup/punchline pair: both halves
/// case-folded and whitespace-collapsed, joined with a separator that cannot
/// occur inside either half after normalization.
pub fn fingerprint(setup: &str, punchline: &str) -> String {
  format!(
    "{}|||{}",
    normalize_whitespace(setup).to_lowercase(),
    normalize_whitespace(punchline).to_lowercase()
  )
}

/// Per-acquisition membership structure over everything ever committed:
/// provenance tags and text fingerprints. A candidate matching on either axis
/// counts as already used — two releases with different provenance but
/// identical normalized text are the same content.
#[derive(Debug, Default)]
pub struct UsedContentIndex {
  source_api_ids: HashSet<String>,
  fingerprints:   HashSet<String>,
}

impl UsedContentIndex {
  pub fn from_history(rows: &[HistoryRow]) -> Self {
    let mut index = Self::default();
    for row in rows {
      index.insert(&row.source_api_id, &row.setup, &row.punchline);
    }
    index
  }

  pub fn insert(&mut self, source_api_id: &str, setup: &str, punchline: &str) {
    if !source_api_id.is_empty() {
      self.source_api_ids.insert(source_api_id.to_owned());
    }
    self.fingerprints.insert(fingerprint(setup, punchline));
  }

  /// `true` if the candidate's provenance tag or fingerprint has been
  /// committed before.
  pub fn contains(&self, candidate: &Candidate) -> bool {
    self.source_api_ids.contains(&candidate.source_api_id)
      || self.fingerprints.contains(&candidate.fingerprint())
  }

  pub fn len(&self) -> usize {
    self.fingerprints.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fingerprints.is_empty()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(setup: &str, punchline: &str, id: &str) -> Candidate {
    Candidate {
      setup:         setup.to_owned(),
      punchline:     punchline.to_owned(),
      source_api_id: id.to_owned(),
    }
  }

  fn history(rows: &[(&str, &str, &str)]) -> Vec<HistoryRow> {
    rows
      .iter()
      .map(|(id, setup, punchline)| HistoryRow {
        source_api_id: (*id).to_owned(),
        setup:         (*setup).to_owned(),
        punchline:     (*punchline).to_owned(),
      })
      .collect()
  }

  #[test]
  fn matches_on_provenance_tag() {
    let index = UsedContentIndex::from_history(&history(&[("42", "Why?", "Because.")]));
    assert!(index.contains(&candidate("Something new?", "Entirely.", "42")));
  }

  #[test]
  fn matches_on_fingerprint_across_provenance() {
    let index = UsedContentIndex::from_history(&history(&[("a", "Why?", "Because.")]));
    assert!(index.contains(&candidate("Why?", "Because.", "b")));
  }

  #[test]
  fn fingerprint_ignores_case_and_whitespace() {
    let index =
      UsedContentIndex::from_history(&history(&[("a", "Why  did it\train?", "BECAUSE.")]));
    assert!(index.contains(&candidate("why did it rain?", "because.", "b")));
  }

  #[test]
  fn novel_candidate_is_not_contained() {
    let index = UsedContentIndex::from_history(&history(&[("a", "Why?", "Because.")]));
    assert!(!index.contains(&candidate("How?", "Like so.", "b")));
  }

  #[test]
  fn empty_provenance_tags_are_not_indexed() {
    let index = UsedContentIndex::from_history(&history(&[("", "Why?", "Because.")]));
    assert!(!index.contains(&candidate("How?", "Like so.", "")));
  }
}
