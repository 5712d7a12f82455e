//! The deployment's reference time zone.
//!
//! Schedules, the day boundary and "satisfied today" are all evaluated on the
//! wall clock of this zone.

use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Accepted spellings: `utc`, `local` (the host's zone, DST-aware) or a
/// fixed offset such as `+01:00` / `-05:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReferenceZone {
  #[default]
  Utc,
  Local,
  Fixed(FixedOffset),
}

impl ReferenceZone {
  /// Wall-clock time of `at` in this zone.
  pub fn local_time(&self, at: DateTime<Utc>) -> NaiveDateTime {
    match self {
      Self::Utc => at.naive_utc(),
      Self::Local => at.with_timezone(&Local).naive_local(),
      Self::Fixed(offset) => at.with_timezone(offset).naive_local(),
    }
  }

  /// Calendar date of `at` in this zone.
  pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate { self.local_time(at).date() }
}

impl fmt::Display for ReferenceZone {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Utc => f.write_str("utc"),
      Self::Local => f.write_str("local"),
      Self::Fixed(offset) => write!(f, "{offset}"),
    }
  }
}

impl FromStr for ReferenceZone {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let bad = || Error::InvalidZone(s.to_owned());
    match s.trim().to_ascii_lowercase().as_str() {
      "utc" | "z" => return Ok(Self::Utc),
      "local" => return Ok(Self::Local),
      _ => {}
    }

    let s = s.trim();
    let sign = match s.chars().next() {
      Some('+') => 1,
      Some('-') => -1,
      _ => return Err(bad()),
    };
    let (h, m) = s[1..].split_once(':').ok_or_else(bad)?;
    let hours = offset_field(h, 23).ok_or_else(bad)?;
    let minutes = offset_field(m, 59).ok_or_else(bad)?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
      .map(Self::Fixed)
      .ok_or_else(bad)
  }
}

/// One or two ASCII digits no greater than `max`. Signs are rejected here;
/// the offset carries exactly one, up front.
fn offset_field(s: &str, max: i32) -> Option<i32> {
  if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok().filter(|&v| v <= max)
}

impl TryFrom<String> for ReferenceZone {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<ReferenceZone> for String {
  fn from(z: ReferenceZone) -> Self { z.to_string() }
}
