//! The slot clock — pure time-to-slot arithmetic.
//!
//! Two release slots exist per calendar day: [`Period::Early`] before noon and
//! [`Period::Late`] from noon onward. All computation happens over an
//! injectable [`DateTime<Utc>`] so that both the requester and the release
//! engine share one contract. UTC is the reference clock throughout; callers
//! in other timezones convert before asking.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike as _, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Period ──────────────────────────────────────────────────────────────────

/// The half-day a release belongs to. `Early < Late` within one day.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
  Early,
  Late,
}

impl Period {
  /// The canonical wire token.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Early => "EARLY",
      Self::Late => "LATE",
    }
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Period {
  type Err = Error;

  /// Case-insensitive on input; the wire form is uppercase.
  fn from_str(s: &str) -> Result<Self> {
    if s.eq_ignore_ascii_case("early") {
      Ok(Self::Early)
    } else if s.eq_ignore_ascii_case("late") {
      Ok(Self::Late)
    } else {
      Err(Error::InvalidPeriod(s.to_owned()))
    }
  }
}

// ─── SlotId ──────────────────────────────────────────────────────────────────

/// Canonical identifier of one release slot: a calendar day plus a period.
///
/// Identifiers are immutable values; they are computed fresh from a timestamp
/// or derived from another identifier, never mutated. Ordering is
/// `(date, period)` lexicographic.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlotId {
  pub date:   NaiveDate,
  pub period: Period,
}

impl SlotId {
  pub fn new(date: NaiveDate, period: Period) -> Self {
    Self { date, period }
  }

  /// The slot in effect at `now`: hour < 12 is [`Period::Early`], else
  /// [`Period::Late`]. Total and deterministic for any timestamp.
  pub fn at(now: DateTime<Utc>) -> Self {
    let period = if now.hour() < 12 { Period::Early } else { Period::Late };
    Self { date: now.date_naive(), period }
  }

  /// The instant this slot's successor begins: noon the same day for
  /// [`Period::Early`], midnight the next day for [`Period::Late`].
  pub fn next_boundary(&self) -> DateTime<Utc> {
    match self.period {
      Period::Early => self.date.and_time(noon()).and_utc(),
      Period::Late => next_day(self.date).and_time(NaiveTime::MIN).and_utc(),
    }
  }

  /// Late→Early on the same day; Early→Late on the previous day.
  pub fn predecessor(&self) -> Self {
    match self.period {
      Period::Late => Self { date: self.date, period: Period::Early },
      Period::Early => Self {
        date:   self.date.pred_opt().unwrap_or(self.date),
        period: Period::Late,
      },
    }
  }

  /// Early→Late on the same day; Late→Early on the next day.
  pub fn successor(&self) -> Self {
    match self.period {
      Period::Early => Self { date: self.date, period: Period::Late },
      Period::Late => Self { date: next_day(self.date), period: Period::Early },
    }
  }

  /// This slot followed by `count` predecessors, most recent first.
  /// The returned sequence has length exactly `count + 1` and no gaps, so a
  /// consumer can walk a bounded window instead of scanning history.
  pub fn lookback(&self, count: usize) -> Vec<Self> {
    let mut slots = Vec::with_capacity(count + 1);
    let mut cursor = *self;
    for _ in 0..=count {
      slots.push(cursor);
      cursor = cursor.predecessor();
    }
    slots
  }

  /// Parse the two wire parameters. `None` means "use the current value at
  /// `now`" — the documented default for the inbound request surface.
  pub fn from_params(
    date:   Option<&str>,
    period: Option<&str>,
    now:    DateTime<Utc>,
  ) -> Result<Self> {
    let current = Self::at(now);
    let date = match date {
      Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDate(raw.to_owned()))?,
      None => current.date,
    };
    let period = match period {
      Some(raw) => raw.parse()?,
      None => current.period,
    };
    Ok(Self { date, period })
  }
}

impl fmt::Display for SlotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.period)
  }
}

// ─── Countdown ───────────────────────────────────────────────────────────────

/// Format a remaining duration as `HH:MM:SS`. Negative durations clamp to
/// zero; hours are not wrapped at 24.
pub fn countdown_label(remaining: Duration) -> String {
  let total_seconds = remaining.num_seconds().max(0);
  let hours = total_seconds / 3600;
  let minutes = (total_seconds % 3600) / 60;
  let seconds = total_seconds % 60;
  format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn noon() -> NaiveTime {
  NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn next_day(date: NaiveDate) -> NaiveDate {
  date.succ_opt().unwrap_or(date)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
