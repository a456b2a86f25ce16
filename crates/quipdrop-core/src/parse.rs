//! Candidate validation and the tolerant provider-payload parser.
//!
//! Every content source — live provider, curated fallback pool, static list —
//! goes through the same validation: after whitespace normalization the text
//! must split on a `?` into a non-empty question setup and a non-empty
//! trailing punchline. Anything else is "no candidate", never a hard error.

use serde_json::Value;
use uuid::Uuid;

use crate::release::Candidate;

/// Collapse all runs of whitespace to single spaces and trim the ends.
pub fn normalize_whitespace(raw: &str) -> String {
  raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The question part of `raw`, if `raw` is question-shaped: non-empty after
/// normalization, containing a `?` with a non-empty setup before it. Trailing
/// text after the `?` is permitted and ignored.
pub fn question_setup(raw: &str) -> Option<String> {
  let normalized = normalize_whitespace(raw);
  let mark = normalized.find('?')?;
  let setup = normalized[..=mark].trim().to_owned();
  if setup.len() <= 1 {
    return None;
  }
  Some(setup)
}

/// Split `raw` into a `?`-terminated setup and a non-empty trailing
/// punchline. Returns `None` when either half is missing.
pub fn parse_question_answer(raw: &str) -> Option<(String, String)> {
  let normalized = normalize_whitespace(raw);
  let mark = normalized.find('?')?;
  let setup = normalized[..=mark].trim().to_owned();
  let punchline = normalized[mark + 1..].trim().to_owned();
  if setup.len() <= 1 || punchline.is_empty() {
    return None;
  }
  Some((setup, punchline))
}

/// Validate an explicit setup/punchline pair into a [`Candidate`].
///
/// The setup is trimmed to its question part (text after the first `?` is
/// dropped); the punchline must be non-empty after normalization.
pub fn candidate_from_parts(
  setup:         &str,
  punchline:     &str,
  source_api_id: impl Into<String>,
) -> Option<Candidate> {
  let setup = question_setup(setup)?;
  let punchline = normalize_whitespace(punchline);
  if punchline.is_empty() {
    return None;
  }
  Some(Candidate { setup, punchline, source_api_id: source_api_id.into() })
}

/// Parse a free-text blob (e.g. a single `joke` field) into a candidate by
/// splitting on the first `?`. The provenance tag is synthesized since the
/// source carries none.
pub fn candidate_from_text(raw: &str) -> Option<Candidate> {
  let (setup, punchline) = parse_question_answer(raw)?;
  Some(Candidate {
    setup,
    punchline,
    source_api_id: format!("text-{}", Uuid::new_v4()),
  })
}

/// Tolerant parser for provider payloads. Accepts, in order:
///
/// - an array, scanned element-by-element for the first shape that parses;
/// - a flat `{"setup": ..., "punchline": ...}` object, with an optional
///   string-or-number `id` used as the provenance tag;
/// - a `{"joke": "..."}` free-text object, split on the first `?`;
/// - a `{"value": ...}` wrapper, unwrapped recursively.
pub fn parse_provider_payload(payload: &Value) -> Option<Candidate> {
  match payload {
    Value::Array(rows) => rows.iter().find_map(parse_provider_payload),
    Value::Object(row) => {
      if let (Some(Value::String(setup)), Some(Value::String(punchline))) =
        (row.get("setup"), row.get("punchline"))
      {
        let source_api_id = match row.get("id") {
          Some(Value::String(id)) => id.clone(),
          Some(Value::Number(id)) => id.to_string(),
          _ => format!("api-{}", Uuid::new_v4()),
        };
        return candidate_from_parts(setup, punchline, source_api_id);
      }

      if let Some(Value::String(joke)) = row.get("joke") {
        return candidate_from_text(joke);
      }

      match row.get("value") {
        Some(nested @ (Value::Object(_) | Value::Array(_))) => {
          parse_provider_payload(nested)
        }
        _ => None,
      }
    }
    _ => None,
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
