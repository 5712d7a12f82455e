//! Reminder tasks: recurring obligations owned by one subject.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, channel::{Channel, dedup_channels}};

/// A recurring obligation owned by one subject.
///
/// `attempts_today`, `last_satisfied_at` and `escalated_at` are the mutable
/// per-day counters. `escalated_at` is only ever non-null while
/// `attempts_today >= escalation_threshold`; the store enforces this with a
/// CHECK constraint and a compare-and-swap update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderTask {
  pub task_id:              Uuid,
  pub subject_id:           Uuid,
  pub title:                String,
  /// Longer reminder text; the title is used when absent.
  pub message:              Option<String>,
  /// Ordered set of channels; never contains duplicates.
  pub delivery_methods:     Vec<Channel>,
  pub use_voice_clone:      bool,
  /// Provider-side reference to the subject's enrolled voice profile.
  pub voice_profile:        Option<String>,
  pub escalation_threshold: u32,
  pub attempts_today:       u32,
  pub last_satisfied_at:    Option<DateTime<Utc>>,
  pub escalated_at:         Option<DateTime<Utc>>,
  pub created_at:           DateTime<Utc>,
}

impl ReminderTask {
  /// The text read or sent as the body of the reminder.
  pub fn body(&self) -> &str { self.message.as_deref().unwrap_or(&self.title) }

  /// Whether the subject already completed this obligation on `today`.
  /// `local_date` maps an instant to the calendar date of the reference zone.
  pub fn satisfied_on(
    &self,
    today: NaiveDate,
    local_date: impl Fn(DateTime<Utc>) -> NaiveDate,
  ) -> bool {
    self.last_satisfied_at.is_some_and(|at| local_date(at) == today)
  }

  /// The voice profile to clone, if cloning was requested and a profile is
  /// enrolled.
  pub fn clone_profile(&self) -> Option<&str> {
    if self.use_voice_clone { self.voice_profile.as_deref() } else { None }
  }

  /// Whether a count of `attempts` crosses the threshold while no escalation
  /// is open yet today.
  pub fn should_escalate(&self, attempts: u32) -> bool {
    attempts >= self.escalation_threshold && self.escalated_at.is_none()
  }
}

/// Input to `SqliteStore::add_task`. Counters always start at zero.
#[derive(Debug, Clone)]
pub struct NewTask {
  pub subject_id:           Uuid,
  pub title:                String,
  pub message:              Option<String>,
  pub delivery_methods:     Vec<Channel>,
  pub use_voice_clone:      bool,
  pub voice_profile:        Option<String>,
  pub escalation_threshold: u32,
}

impl NewTask {
  /// SMS-only task with an escalation threshold of 3.
  pub fn new(subject_id: Uuid, title: impl Into<String>) -> Self {
    Self {
      subject_id,
      title: title.into(),
      message: None,
      delivery_methods: vec![Channel::Sms],
      use_voice_clone: false,
      voice_profile: None,
      escalation_threshold: 3,
    }
  }

  pub fn with_channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
    self.delivery_methods = dedup_channels(channels);
    self
  }

  pub fn with_threshold(mut self, threshold: u32) -> Self {
    self.escalation_threshold = threshold;
    self
  }

  pub fn with_voice_clone(mut self, profile: impl Into<String>) -> Self {
    self.use_voice_clone = true;
    self.voice_profile = Some(profile.into());
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.escalation_threshold == 0 {
      return Err(Error::ZeroThreshold);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::{FixedOffset, TimeZone};

  use super::*;

  fn task() -> ReminderTask {
    ReminderTask {
      task_id:              Uuid::nil(),
      subject_id:           Uuid::nil(),
      title:                "Take blood pressure tablet".into(),
      message:              None,
      delivery_methods:     vec![Channel::Sms],
      use_voice_clone:      false,
      voice_profile:        Some("vp-1".into()),
      escalation_threshold: 2,
      attempts_today:       0,
      last_satisfied_at:    None,
      escalated_at:         None,
      created_at:           Utc::now(),
    }
  }

  #[test]
  fn satisfied_uses_local_calendar_day() {
    let mut t = task();
    // 23:30 UTC on the 1st is 00:30 on the 2nd at UTC+1.
    t.last_satisfied_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap());
    let plus_one = FixedOffset::east_opt(3600).unwrap();
    let utc_date = |at: DateTime<Utc>| at.date_naive();
    let plus_one_date = |at: DateTime<Utc>| at.with_timezone(&plus_one).date_naive();

    let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let second = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
    assert!(t.satisfied_on(first, utc_date));
    assert!(!t.satisfied_on(second, utc_date));
    assert!(t.satisfied_on(second, plus_one_date));
  }

  #[test]
  fn clone_profile_requires_flag() {
    let mut t = task();
    assert_eq!(t.clone_profile(), None);
    t.use_voice_clone = true;
    assert_eq!(t.clone_profile(), Some("vp-1"));
  }

  #[test]
  fn escalation_is_edge_triggered() {
    let mut t = task();
    assert!(!t.should_escalate(1));
    assert!(t.should_escalate(2));
    t.escalated_at = Some(Utc::now());
    assert!(!t.should_escalate(5));
  }

  #[test]
  fn zero_threshold_is_invalid() {
    let input = NewTask::new(Uuid::nil(), "x").with_threshold(0);
    assert!(matches!(input.validate(), Err(Error::ZeroThreshold)));
  }
}
