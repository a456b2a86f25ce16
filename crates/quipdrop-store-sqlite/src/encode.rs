//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar days as `YYYY-MM-DD`,
//! periods as lowercase discriminants, and UUIDs as hyphenated lowercase
//! strings.

use chrono::{DateTime, NaiveDate, Utc};
use quipdrop_core::{
  release::Release,
  slot::{Period, SlotId},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Period ──────────────────────────────────────────────────────────────────

pub fn encode_period(p: Period) -> &'static str {
  match p {
    Period::Early => "early",
    Period::Late => "late",
  }
}

pub fn decode_period(s: &str) -> Result<Period> {
  match s {
    "early" => Ok(Period::Early),
    "late" => Ok(Period::Late),
    other => Err(Error::UnknownPeriod(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `releases` row.
pub struct RawRelease {
  pub release_id:    String,
  pub release_date:  String,
  pub period:        String,
  pub setup:         String,
  pub punchline:     String,
  pub source_api_id: String,
  pub created_at:    String,
}

impl RawRelease {
  pub fn into_release(self) -> Result<Release> {
    Ok(Release {
      release_id:    decode_uuid(&self.release_id)?,
      slot:          SlotId {
        date:   decode_date(&self.release_date)?,
        period: decode_period(&self.period)?,
      },
      setup:         self.setup,
      punchline:     self.punchline,
      source_api_id: self.source_api_id,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
