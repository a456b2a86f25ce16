//! The static fallback list — last-resort, fixed, in-process content.
//!
//! These entries guarantee acquisition can never hard-fail while any of them
//! remains unused. They sit behind the curated pool, which operators can
//! extend without a deploy.

use quipdrop_core::{parse::candidate_from_parts, release::Candidate};

const STATIC_FALLBACKS: &[(&str, &str)] = &[
  (
    "Why did the scarecrow win an award?",
    "Because he was outstanding in his field.",
  ),
  ("What do you call fake spaghetti?", "An impasta."),
  ("Why do cows wear bells?", "Because their horns do not work."),
  (
    "Why could the bicycle not stand up by itself?",
    "It was two-tired.",
  ),
];

/// The static entries as validated candidates, with stable provenance tags.
pub(crate) fn static_candidates() -> Vec<Candidate> {
  STATIC_FALLBACKS
    .iter()
    .enumerate()
    .filter_map(|(index, (setup, punchline))| {
      candidate_from_parts(setup, punchline, format!("fallback:static:{index}"))
    })
    .collect()
}
