//! Recurrence rules for reminder tasks.
//!
//! A rule is a (day, hour:minute) pair at minute granularity. Matching is
//! exact: a rule one minute off the current tick never fires, and a missed
//! tick is never caught up.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Day ─────────────────────────────────────────────────────────────────────

/// Which days a schedule fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScheduleDay {
  EveryDay,
  /// A single day of the week.
  On(Weekday),
}

impl ScheduleDay {
  /// Build from the stored index: 0 = Sunday … 6 = Saturday.
  pub fn from_index(index: u8) -> Result<Self> {
    let day = match index {
      0 => Weekday::Sun,
      1 => Weekday::Mon,
      2 => Weekday::Tue,
      3 => Weekday::Wed,
      4 => Weekday::Thu,
      5 => Weekday::Fri,
      6 => Weekday::Sat,
      other => return Err(Error::InvalidDayOfWeek(other)),
    };
    Ok(Self::On(day))
  }

  /// The stored index, or `None` for the every-day wildcard.
  pub fn index(self) -> Option<u8> {
    match self {
      Self::EveryDay => None,
      Self::On(day) => Some(day.num_days_from_sunday() as u8),
    }
  }

  pub fn matches(self, day: Weekday) -> bool {
    match self {
      Self::EveryDay => true,
      Self::On(d) => d == day,
    }
  }
}

// ─── Time of day ─────────────────────────────────────────────────────────────

/// A wall-clock time at minute granularity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
  hour:   u8,
  minute: u8,
}

impl TimeOfDay {
  pub fn new(hour: u8, minute: u8) -> Result<Self> {
    if hour > 23 || minute > 59 {
      return Err(Error::InvalidTimeOfDay { hour, minute });
    }
    Ok(Self { hour, minute })
  }

  pub fn hour(self) -> u8 { self.hour }

  pub fn minute(self) -> u8 { self.minute }

  /// Truncate a local timestamp to its hour:minute.
  pub fn of(at: &NaiveDateTime) -> Self {
    Self { hour: at.hour() as u8, minute: at.minute() as u8 }
  }
}

impl fmt::Display for TimeOfDay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour, self.minute)
  }
}

impl FromStr for TimeOfDay {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let bad = || Error::UnparsableTimeOfDay(s.to_owned());
    let (h, m) = s.split_once(':').ok_or_else(bad)?;
    let hour = h.trim().parse::<u8>().map_err(|_| bad())?;
    let minute = m.trim().parse::<u8>().map_err(|_| bad())?;
    Self::new(hour, minute)
  }
}

impl TryFrom<String> for TimeOfDay {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<TimeOfDay> for String {
  fn from(t: TimeOfDay) -> Self { t.to_string() }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// One recurrence rule for a [`ReminderTask`](crate::task::ReminderTask).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderSchedule {
  pub schedule_id: Uuid,
  pub task_id:     Uuid,
  pub day:         ScheduleDay,
  pub time:        TimeOfDay,
}

impl ReminderSchedule {
  /// Whether this rule fires at the local minute `now`.
  pub fn is_due(&self, now: &NaiveDateTime) -> bool {
    self.day.matches(now.weekday()) && self.time == TimeOfDay::of(now)
  }
}

// ─── Occurrence key ──────────────────────────────────────────────────────────

/// Identifies one firing of one schedule. Used as a dedupe key so a
/// duplicated tick for the same minute cannot count an occurrence twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccurrenceKey {
  pub task_id:     Uuid,
  pub schedule_id: Uuid,
  /// Local minute of the firing, seconds truncated.
  pub minute:      NaiveDateTime,
}

impl OccurrenceKey {
  pub fn new(schedule: &ReminderSchedule, now: &NaiveDateTime) -> Self {
    let minute = now
      .with_second(0)
      .and_then(|t| t.with_nanosecond(0))
      .unwrap_or(*now);
    Self { task_id: schedule.task_id, schedule_id: schedule.schedule_id, minute }
  }

  /// Sortable text form, `YYYY-MM-DDTHH:MM`.
  pub fn minute_key(&self) -> String { self.minute.format("%Y-%m-%dT%H:%M").to_string() }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
      .unwrap()
      .and_hms_opt(h, mi, 0)
      .unwrap()
  }

  fn rule(day: ScheduleDay, h: u8, m: u8) -> ReminderSchedule {
    ReminderSchedule {
      schedule_id: Uuid::new_v4(),
      task_id:     Uuid::new_v4(),
      day,
      time:        TimeOfDay::new(h, m).unwrap(),
    }
  }

  #[test]
  fn weekday_index_roundtrip() {
    for i in 0..7 {
      assert_eq!(ScheduleDay::from_index(i).unwrap().index(), Some(i));
    }
    assert_eq!(ScheduleDay::from_index(0).unwrap(), ScheduleDay::On(Weekday::Sun));
    assert!(ScheduleDay::from_index(7).is_err());
    assert_eq!(ScheduleDay::EveryDay.index(), None);
  }

  #[test]
  fn due_requires_exact_minute() {
    // 2024-03-04 is a Monday.
    let r = rule(ScheduleDay::On(Weekday::Mon), 9, 30);
    assert!(r.is_due(&at(2024, 3, 4, 9, 30)));
    assert!(!r.is_due(&at(2024, 3, 4, 9, 29)));
    assert!(!r.is_due(&at(2024, 3, 4, 9, 31)));
    assert!(!r.is_due(&at(2024, 3, 5, 9, 30)));
  }

  #[test]
  fn wildcard_matches_every_day() {
    let r = rule(ScheduleDay::EveryDay, 18, 0);
    for d in 4..11 {
      assert!(r.is_due(&at(2024, 3, d, 18, 0)));
    }
  }

  #[test]
  fn time_of_day_parse_and_display() {
    let t: TimeOfDay = "07:05".parse().unwrap();
    assert_eq!((t.hour(), t.minute()), (7, 5));
    assert_eq!(t.to_string(), "07:05");
    assert!("24:00".parse::<TimeOfDay>().is_err());
    assert!("noon".parse::<TimeOfDay>().is_err());
  }

  #[test]
  fn occurrence_key_truncates_seconds() {
    let r = rule(ScheduleDay::EveryDay, 8, 0);
    let now = NaiveDate::from_ymd_opt(2024, 3, 4)
      .unwrap()
      .and_hms_opt(8, 0, 42)
      .unwrap();
    assert_eq!(OccurrenceKey::new(&r, &now).minute_key(), "2024-03-04T08:00");
  }
}
